//! Requests, release assets and cached resolutions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset_pattern::AssetPattern;
use crate::hash::QueryHash;

/// Release tag that asks the provider for its most recent release.
pub const LATEST_RELEASE: &str = "latest";

/// Platform assumed when a request does not name one.
pub const DEFAULT_PLATFORM: &str = "linux";

/// One resolution request.
///
/// Equality is structural over every field, token included, and the same
/// holds for [`Query::cache_key`]: two requests that differ only by token never
/// share a cached result.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Repository owner (user or organization).
    pub user: String,
    /// Repository name.
    pub program: String,
    /// Display name override for the installed binary. Cosmetic only.
    pub as_program: String,
    /// Release tag, or [`LATEST_RELEASE`].
    pub release: String,
    /// Substring every candidate asset name must contain. Empty means no filter.
    pub include: String,
    /// Target architecture override. Empty means any architecture.
    pub arch: String,
    /// Target operating system.
    pub platform: String,
    /// Provider identifier (`github`, `gitlab`, `codeberg`, `forgejo`).
    pub provider: String,
    /// Provider base URL override. Required for `forgejo`.
    pub base_url: String,
    /// API token. Never serialized and never printed.
    #[serde(skip_serializing, default)]
    pub token: String,
    /// Move the installed binary onto `PATH`.
    pub move_to_path: bool,
    /// Skip TLS verification in the download step.
    pub insecure: bool,
    /// Repository visibility, filled in from provider metadata.
    pub private: bool,
}

impl Query {
    /// Create a query for `user/program` with the default release, platform
    /// and provider.
    pub fn new(user: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            program: program.into(),
            as_program: String::new(),
            release: LATEST_RELEASE.to_string(),
            include: String::new(),
            arch: String::new(),
            platform: DEFAULT_PLATFORM.to_string(),
            provider: String::new(),
            base_url: String::new(),
            token: String::new(),
            move_to_path: true,
            insecure: false,
            private: false,
        }
    }

    /// Canonical hash of the whole request, used as the result cache key.
    pub fn cache_key(&self) -> QueryHash {
        QueryHash::of(self)
    }

    /// Name to install the binary under: the override if present, otherwise the repository name.
    pub fn display_name(&self) -> &str {
        if self.as_program.is_empty() {
            &self.program
        } else {
            &self.as_program
        }
    }

    /// Whether the request asks for the provider's most recent release.
    pub fn is_latest(&self) -> bool {
        self.release == LATEST_RELEASE
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Query")
            .field("user", &self.user)
            .field("program", &self.program)
            .field("as_program", &self.as_program)
            .field("release", &self.release)
            .field("include", &self.include)
            .field("arch", &self.arch)
            .field("platform", &self.platform)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("token", &token)
            .field("move_to_path", &self.move_to_path)
            .field("insecure", &self.insecure)
            .field("private", &self.private)
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.user, self.program, self.release)
    }
}

/// A release asset as the provider reports it, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAsset {
    /// File name of the asset.
    pub name: String,
    /// Direct download URL.
    pub url: String,
}

/// A release fetched from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// The tag the provider resolved the request to (e.g. `v1.2.3`).
    pub version: String,
    /// Assets attached to the release, in provider order.
    pub assets: Vec<RawAsset>,
}

/// The repository facts the resolver needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Whether the repository is private.
    pub private: bool,
}

/// One classified release artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name as published.
    pub name: String,
    /// Normalized OS token, empty if unknown.
    pub os: String,
    /// Normalized architecture token, empty if unknown.
    pub arch: String,
    /// Download URL.
    pub url: String,
    /// File-type suffix such as `.tar.gz`, empty if none.
    #[serde(rename = "type")]
    pub file_type: String,
}

impl Asset {
    /// Classify a raw provider asset by its file name.
    pub fn classify(raw: RawAsset) -> Self {
        let AssetPattern {
            os,
            arch,
            file_type,
        } = AssetPattern::from_filename(&raw.name);
        Self {
            name: raw.name,
            os,
            arch,
            url: raw.url,
            file_type,
        }
    }

    /// `os/arch`, e.g. `linux/amd64`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    /// Whether this is a 32-bit x86 build.
    pub fn is_32bit(&self) -> bool {
        self.arch == "386"
    }

    /// Whether this targets macOS.
    pub fn is_mac(&self) -> bool {
        self.os == "darwin"
    }

    /// Whether this is a native Apple Silicon build.
    pub fn is_mac_on_apple_silicon(&self) -> bool {
        self.is_mac() && self.arch == "arm64"
    }
}

/// The assets of one release, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assets(pub Vec<Asset>);

impl Assets {
    /// Whether any asset is a native Apple Silicon build.
    pub fn has_apple_silicon(&self) -> bool {
        self.0.iter().any(Asset::is_mac_on_apple_silicon)
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the release has no assets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in provider order.
    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.0.iter()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[Asset] {
        &self.0
    }
}

impl FromIterator<Asset> for Assets {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Assets {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The fully resolved outcome of one [`Query`].
///
/// This is the value the result cache holds and the only thing handed to
/// rendering layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The request, with `private` filled in from repository metadata.
    #[serde(flatten)]
    pub query: Query,
    /// When the resolution was computed.
    pub timestamp: DateTime<Utc>,
    /// Every asset of the release, unfiltered.
    pub assets: Assets,
    /// The asset picked for the requested OS and architecture.
    pub selected: Asset,
    /// The resolved release tag.
    pub version: String,
    /// Whether the release ships a native Apple Silicon build.
    pub has_apple_silicon: bool,
}
