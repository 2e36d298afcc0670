//! GitHub REST adapter. Codeberg and Forgejo expose the same release API and
//! are served by this adapter pointed at their own base URL.

use async_trait::async_trait;
use grab_schema::{LATEST_RELEASE, RawAsset, Release, RepositoryMetadata};
use reqwest::Client;
use serde::Deserialize;

use super::http::{api_url, get_json};
use super::traits::ReleaseSource;
use crate::error::ResolveError;

/// Public GitHub API root.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
/// Public Codeberg API root.
pub const DEFAULT_CODEBERG_API: &str = "https://codeberg.org/api/v1";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
struct GithubRepository {
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

/// Client for a GitHub-compatible release API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    base_url: String,
    client: Client,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorization(token: &str) -> Option<String> {
        (!token.is_empty()).then(|| format!("token {token}"))
    }

    fn repo_url(&self, owner: &str, name: &str) -> Result<String, ResolveError> {
        api_url(&self.base_url, &["repos", owner, name])
    }

    fn release_url(&self, owner: &str, name: &str, tag: &str) -> Result<String, ResolveError> {
        if tag == LATEST_RELEASE {
            api_url(&self.base_url, &["repos", owner, name, "releases", "latest"])
        } else {
            api_url(&self.base_url, &["repos", owner, name, "releases", "tags", tag])
        }
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    fn key(&self) -> String {
        format!("github:{}", self.base_url)
    }

    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> Result<RepositoryMetadata, ResolveError> {
        let url = self.repo_url(owner, name)?;
        let repo: GithubRepository =
            get_json(&self.client, &url, GITHUB_ACCEPT, Self::authorization(token)).await?;
        Ok(RepositoryMetadata {
            private: repo.private,
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
        let release: GithubRelease =
            get_json(&self.client, &url, GITHUB_ACCEPT, Self::authorization(token)).await?;
        Ok(Release {
            version: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| RawAsset {
                    name: a.name,
                    url: a.browser_download_url,
                })
                .collect(),
        })
    }
}
