//! The platform a request asks for, normalized for comparison.

use serde::{Deserialize, Serialize};

use crate::asset_pattern::{classify_arch, classify_os};
use crate::types::Query;

/// What the asset selector is looking for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Normalized OS token the asset must carry.
    pub os: String,
    /// Preferred architecture token. Empty means any.
    pub arch: String,
    /// Substring the asset name must contain. Empty means no filter.
    pub include: String,
}

impl Target {
    /// Build a target from raw OS and architecture strings.
    ///
    /// Values the classifier recognizes are normalized (`macos` becomes
    /// `darwin`, `x86_64` becomes `amd64`); anything else is kept lower-cased
    /// so it can still be compared against asset tokens.
    pub fn new(os: &str, arch: &str, include: impl Into<String>) -> Self {
        Self {
            os: normalize_with(os, classify_os),
            arch: normalize_with(arch, classify_arch),
            include: include.into(),
        }
    }

    /// The target a query asks for.
    pub fn from_query(query: &Query) -> Self {
        Self::new(&query.platform, &query.arch, query.include.clone())
    }
}

fn normalize_with(raw: &str, classify: fn(&str) -> Option<&'static str>) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match classify(raw) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => raw.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_normalizes_known_tokens() {
        let t = Target::new("macOS", "x86_64", "");
        assert_eq!(t.os, "darwin");
        assert_eq!(t.arch, "amd64");
    }

    #[test]
    fn test_target_keeps_unknown_tokens() {
        let t = Target::new("linux", "RISCV64", "musl");
        assert_eq!(t.os, "linux");
        assert_eq!(t.arch, "riscv64");
        assert_eq!(t.include, "musl");
    }

    #[test]
    fn test_target_empty_arch_means_any() {
        let q = Query::new("acme", "tool");
        let t = Target::from_query(&q);
        assert_eq!(t.os, "linux");
        assert!(t.arch.is_empty());
    }
}
