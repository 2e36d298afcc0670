//! Filename heuristics for release assets.
//! Vendors name their artifacts inconsistently: macos/darwin/osx, arm64/aarch64, x86_64/amd64/x64.
//!
//! Each classifier is a single leftmost-first regex scan over the lower-cased
//! name followed by a fixed normalization table. A name that carries several
//! tokens (say both `arm` and `arm64`) resolves to whichever alternative the
//! scan reaches first, and existing download links depend on that order.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static OS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(darwin|linux|(net|free|open)bsd|mac|osx|windows|win)").expect("valid OS regex")
});

static ARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(armv8|armv7|x64|arm64|arm|386|686|amd64|x86_64|aarch64|linux64|win64)")
        .expect("valid arch regex")
});

static FILE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.tar)?(\.[a-z][a-z0-9]+)$").expect("valid extension regex"));

/// Detect the operating system named in `text`.
///
/// Returns the normalized token (`darwin`, `linux`, `netbsd`, `freebsd`,
/// `openbsd` or `windows`), or `None` when no OS keyword is present.
///
/// # Example
///
/// ```
/// use grab_schema::classify_os;
///
/// assert_eq!(classify_os("MyApp-Darwin-arm64.tar.gz"), Some("darwin"));
/// assert_eq!(classify_os("tool_osx.zip"), Some("darwin"));
/// assert_eq!(classify_os("tool.exe"), None);
/// ```
pub fn classify_os(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let token = OS_RE.find(&lower)?.as_str();
    Some(match token {
        "darwin" | "mac" | "osx" => "darwin",
        "linux" => "linux",
        "netbsd" => "netbsd",
        "freebsd" => "freebsd",
        "openbsd" => "openbsd",
        _ => "windows",
    })
}

/// Detect the CPU architecture named in `text`.
///
/// Returns the normalized token, or `None` when no architecture keyword is
/// present. See [`normalize_arch`] for the aliases that get folded together.
pub fn classify_arch(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let token = ARCH_RE.find(&lower)?.as_str();
    Some(normalize_arch(token))
}

/// Fold an architecture alias into its canonical token.
///
/// `linux64`, `x86_64`, `win64` and `x64` become `amd64`; `32` and `686`
/// become `386`; `aarch64` and `armv8` become `arm64`. The remaining tokens
/// of the alternation (`arm`, `armv7`, `386`, `amd64`, `arm64`) pass through.
/// Anything else is returned as an empty string.
pub fn normalize_arch(token: &str) -> &'static str {
    match token {
        "linux64" | "x86_64" | "win64" | "x64" | "amd64" => "amd64",
        "32" | "686" | "386" => "386",
        "aarch64" | "armv8" | "arm64" => "arm64",
        "armv7" => "armv7",
        "arm" => "arm",
        _ => "",
    }
}

/// Extract the trailing file-type suffix of `text`, e.g. `.tar.gz` or `.zip`.
///
/// Matching is case-sensitive: the final extension must be lower-case.
pub fn extract_file_ext(text: &str) -> Option<&str> {
    FILE_EXT_RE.find(text).map(|m| m.as_str())
}

/// The platform indicators recovered from one asset filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPattern {
    /// Normalized OS token, empty if none was found.
    pub os: String,
    /// Normalized architecture token, empty if none was found.
    pub arch: String,
    /// File-type suffix including the leading dot, empty if none was found.
    pub file_type: String,
}

impl AssetPattern {
    /// Classify a filename in one pass over each heuristic.
    pub fn from_filename(filename: &str) -> Self {
        Self {
            os: classify_os(filename).unwrap_or_default().to_string(),
            arch: classify_arch(filename).unwrap_or_default().to_string(),
            file_type: extract_file_ext(filename).unwrap_or_default().to_string(),
        }
    }
}
