//! Forge adapters for release-hosting platforms (GitHub, GitLab, Codeberg, Forgejo).

/// GitHub-compatible REST adapter (also Codeberg and Forgejo).
pub mod github;
/// GitLab REST adapter.
pub mod gitlab;
mod http;
/// Shared trait implemented by every adapter.
pub mod traits;

use async_trait::async_trait;
use grab_schema::{Release, RepositoryMetadata};
use reqwest::Client;
use tracing::debug;

pub use github::{DEFAULT_CODEBERG_API, DEFAULT_GITHUB_API, GitHubClient};
pub use gitlab::{DEFAULT_GITLAB_API, GitLabClient};
pub use traits::ReleaseSource;

use crate::error::ResolveError;

/// One of the supported API families.
///
/// A closed set: new hosts are added by pointing an existing variant at a
/// different base URL, not by registering new implementations.
#[derive(Debug, Clone)]
pub enum Forge {
    GitHub(GitHubClient),
    GitLab(GitLabClient),
}

/// Build the adapter for a provider identifier.
///
/// The identifier is trimmed and compared case-insensitively:
///
/// | identifier        | adapter | base URL                                  |
/// |-------------------|---------|-------------------------------------------|
/// | `github` or empty | GitHub  | [`DEFAULT_GITHUB_API`]                    |
/// | `forgejo`         | GitHub  | `{base_url}/api/v1`, `base_url` required  |
/// | `codeberg`        | GitHub  | [`DEFAULT_CODEBERG_API`]                  |
/// | `gitlab`          | GitLab  | `{base_url}/api/v4` or [`DEFAULT_GITLAB_API`] |
///
/// # Errors
///
/// [`ResolveError::Config`] for `forgejo` without a base URL and
/// [`ResolveError::UnsupportedProvider`] for any other identifier.
pub fn new_forge(provider_type: &str, base_url: &str, client: &Client) -> Result<Forge, ResolveError> {
    let provider_type = provider_type.trim().to_lowercase();
    let base_url = base_url.trim().trim_end_matches('/');

    let forge = match provider_type.as_str() {
        "github" | "" => Forge::GitHub(GitHubClient::new(DEFAULT_GITHUB_API, client.clone())),
        "forgejo" => {
            if base_url.is_empty() {
                return Err(ResolveError::Config(
                    "base URL is required for the forgejo provider".to_string(),
                ));
            }
            Forge::GitHub(GitHubClient::new(format!("{base_url}/api/v1"), client.clone()))
        }
        "codeberg" => Forge::GitHub(GitHubClient::new(DEFAULT_CODEBERG_API, client.clone())),
        "gitlab" => {
            let api = if base_url.is_empty() {
                DEFAULT_GITLAB_API.to_string()
            } else {
                format!("{base_url}/api/v4")
            };
            Forge::GitLab(GitLabClient::new(api, client.clone()))
        }
        _ => return Err(ResolveError::UnsupportedProvider(provider_type)),
    };

    debug!(forge = %forge.key(), "constructed forge");
    Ok(forge)
}

#[async_trait]
impl ReleaseSource for Forge {
    fn key(&self) -> String {
        match self {
            Self::GitHub(c) => c.key(),
            Self::GitLab(c) => c.key(),
        }
    }

    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> Result<RepositoryMetadata, ResolveError> {
        match self {
            Self::GitHub(c) => c.fetch_repository(owner, name, token).await,
            Self::GitLab(c) => c.fetch_repository(owner, name, token).await,
        }
    }

    async fn fetch_release(
        &self,
        owner: &str,
        name: &str,
        tag: &str,
        token: &str,
    ) -> Result<Release, ResolveError> {
        match self {
            Self::GitHub(c) => c.fetch_release(owner, name, tag, token).await,
            Self::GitLab(c) => c.fetch_release(owner, name, tag, token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(forge: &Forge) -> &str {
        match forge {
            Forge::GitHub(c) => c.base_url(),
            Forge::GitLab(c) => c.base_url(),
        }
    }

    #[test]
    fn test_github_is_default() {
        let client = Client::new();
        for id in ["github", "", "  GitHub "] {
            let forge = new_forge(id, "", &client).unwrap();
            assert!(matches!(forge, Forge::GitHub(_)));
            assert_eq!(base(&forge), DEFAULT_GITHUB_API);
        }
    }

    #[test]
    fn test_forgejo_requires_base_url() {
        let client = Client::new();
        let err = new_forge("forgejo", "", &client).unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));

        let forge = new_forge("Forgejo", "https://git.example.org/", &client).unwrap();
        assert!(matches!(forge, Forge::GitHub(_)));
        assert_eq!(base(&forge), "https://git.example.org/api/v1");
    }

    #[test]
    fn test_codeberg() {
        let forge = new_forge("codeberg", "", &Client::new()).unwrap();
        assert!(matches!(forge, Forge::GitHub(_)));
        assert_eq!(base(&forge), DEFAULT_CODEBERG_API);
    }

    #[test]
    fn test_gitlab_default_and_override() {
        let client = Client::new();
        let forge = new_forge("gitlab", "", &client).unwrap();
        assert!(matches!(forge, Forge::GitLab(_)));
        assert_eq!(base(&forge), DEFAULT_GITLAB_API);

        let forge = new_forge("GITLAB", "https://gitlab.example.com", &client).unwrap();
        assert_eq!(base(&forge), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_unsupported_provider_names_value() {
        let err = new_forge("bogus", "", &Client::new()).unwrap_err();
        match &err {
            ResolveError::UnsupportedProvider(name) => assert_eq!(name, "bogus"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("bogus"));
    }
}
