//! Shared types for grab: requests, classified release assets and the
//! resolutions cached by the core.

pub mod asset_pattern;
pub mod hash;
pub mod target;
pub mod types;

// Re-exports
pub use asset_pattern::{AssetPattern, classify_arch, classify_os, extract_file_ext, normalize_arch};
pub use hash::QueryHash;
pub use target::Target;
pub use types::*;
