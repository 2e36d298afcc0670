//! Errors surfaced by a resolution.
//!
//! Every failure is terminal for its request: nothing is retried and nothing
//! partial is cached. Messages carry URLs and upstream status text but never
//! the request token.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// The repository, release or tag does not exist upstream (HTTP 404).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The provider answered with something other than 200 or 404.
    #[error("upstream error: {status} {body}")]
    Upstream { status: String, body: String },

    /// The request never produced a response (connect error, timeout, ...).
    #[error("request failed: {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsupported provider type: {0} (supported: github, gitlab, codeberg, forgejo)")]
    UnsupportedProvider(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no asset for requested OS/architecture: {os}/{arch}")]
    NoMatchingAsset { os: String, arch: String },

    /// The provider's JSON did not have the expected shape.
    #[error("malformed response from {url}: {source}")]
    Serialization {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ResolveError {
    /// Stable short name for the error kind, for mapping onto status codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Upstream { .. } => "upstream",
            Self::Transport { .. } => "transport",
            Self::UnsupportedProvider(_) => "unsupported_provider",
            Self::Config(_) => "config",
            Self::NoMatchingAsset { .. } => "no_matching_asset",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Whether the failure is the caller's fault rather than the provider's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::UnsupportedProvider(_)
                | Self::Config(_)
                | Self::NoMatchingAsset { .. }
        )
    }
}
