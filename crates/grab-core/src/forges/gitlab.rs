//! GitLab REST (v4) adapter.

use async_trait::async_trait;
use grab_schema::{LATEST_RELEASE, RawAsset, Release, RepositoryMetadata};
use reqwest::Client;
use serde::Deserialize;

use super::http::{api_url, get_json};
use super::traits::ReleaseSource;
use crate::error::ResolveError;

/// Public GitLab API root.
pub const DEFAULT_GITLAB_API: &str = "https://gitlab.com/api/v4";

const GITLAB_ACCEPT: &str = "application/json";

#[derive(Debug, Deserialize)]
struct GitlabProject {
    #[serde(default)]
    visibility: String,
}

#[derive(Debug, Deserialize)]
struct GitlabRelease {
    tag_name: String,
    #[serde(default)]
    assets: GitlabAssets,
}

#[derive(Debug, Default, Deserialize)]
struct GitlabAssets {
    #[serde(default)]
    links: Vec<GitlabLink>,
}

#[derive(Debug, Deserialize)]
struct GitlabLink {
    name: String,
    url: String,
    #[serde(default)]
    direct_asset_url: Option<String>,
}

/// Client for a GitLab-compatible release API.
///
/// Only release links are reported as assets; the auto-generated source
/// archives GitLab attaches to every release carry no platform.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    base_url: String,
    client: Client,
}

impl GitLabClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(token: &str) -> Option<String> {
        (!token.is_empty()).then(|| format!("Bearer {token}"))
    }

    /// `projects/<owner>%2F<name>`: GitLab addresses a project by its
    /// URL-encoded full path, subgroups included.
    fn project_url(&self, owner: &str, name: &str) -> Result<String, ResolveError> {
        api_url(&self.base_url, &["projects", format!("{owner}/{name}").as_str()])
    }

    fn release_url(&self, owner: &str, name: &str, tag: &str) -> Result<String, ResolveError> {
        let path = format!("{owner}/{name}");
        if tag == LATEST_RELEASE {
            api_url(
                &self.base_url,
                &["projects", path.as_str(), "releases", "permalink", "latest"],
            )
        } else {
            api_url(&self.base_url, &["projects", path.as_str(), "releases", tag])
        }
    }
}

#[async_trait]
impl ReleaseSource for GitLabClient {
    fn key(&self) -> String {
        format!("gitlab:{}", self.base_url)
    }

    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> Result<RepositoryMetadata, ResolveError> {
        let url = self.project_url(owner, name)?;
        let project: GitlabProject =
            get_json(&self.client, &url, GITLAB_ACCEPT, Self::authorization(token)).await?;
        Ok(RepositoryMetadata {
            private: project.visibility == "private",
        })
    }

    async fn fetch_release(
        &self,
        owner: &str,
        name: &str,
        tag: &str,
        token: &str,
    ) -> Result<Release, ResolveError> {
        let url = self.release_url(owner, name, tag)?;
        let release: GitlabRelease =
            get_json(&self.client, &url, GITLAB_ACCEPT, Self::authorization(token)).await?;
        Ok(Release {
            version: release.tag_name,
            assets: release
                .assets
                .links
                .into_iter()
                .map(|link| RawAsset {
                    name: link.name,
                    url: link.direct_asset_url.unwrap_or(link.url),
                })
                .collect(),
        })
    }
}
