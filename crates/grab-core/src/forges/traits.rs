use async_trait::async_trait;
use grab_schema::{Release, RepositoryMetadata};

use crate::error::ResolveError;

/// A release-hosting API (GitHub, GitLab, ...) seen through the two calls the
/// resolver needs.
///
/// Implementations hold no per-request state; one instance serves any number
/// of requests. An empty `token` means the request is sent unauthenticated.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Identifier for this source instance (e.g. "github:https://api.github.com")
    fn key(&self) -> String;

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] on HTTP 404, [`ResolveError::Upstream`] on
    /// any other non-200 status.
    async fn fetch_repository(
        &self,
        owner: &str,
        name: &str,
        token: &str,
    ) -> Result<RepositoryMetadata, ResolveError>;

    /// Fetch a release by tag, or the most recent one when `tag` is `latest`.
    ///
    /// # Errors
    ///
    /// Same as [`ReleaseSource::fetch_repository`].
    async fn fetch_release(
        &self,
        owner: &str,
        name: &str,
        tag: &str,
        token: &str,
    ) -> Result<Release, ResolveError>;
}
