//! Pick the one asset to serve for a target platform.

use grab_schema::{Asset, Target};
use tracing::debug;

use crate::error::ResolveError;

/// Select the asset for `target` from `assets`, in provider order.
///
/// 1. Keep assets whose OS equals `target.os` and, when `target.include` is
///    set, whose name contains it (case-sensitive).
/// 2. If `target.arch` is set and some kept asset matches it exactly, narrow
///    to those. Otherwise keep the whole OS subset: a release without a build
///    for the requested architecture still yields its first build for the OS.
/// 3. The first remaining asset wins.
///
/// # Errors
///
/// [`ResolveError::NoMatchingAsset`] when step 1 leaves nothing.
pub fn select_asset<'a>(assets: &'a [Asset], target: &Target) -> Result<&'a Asset, ResolveError> {
    let for_os: Vec<&Asset> = assets
        .iter()
        .filter(|a| a.os == target.os)
        .filter(|a| target.include.is_empty() || a.name.contains(&target.include))
        .collect();

    let exact_arch = if target.arch.is_empty() {
        None
    } else {
        for_os.iter().copied().find(|a| a.arch == target.arch)
    };

    if exact_arch.is_none() && !target.arch.is_empty() && !for_os.is_empty() {
        debug!(
            os = %target.os,
            arch = %target.arch,
            "no exact architecture match, falling back to first asset for OS"
        );
    }

    exact_arch
        .or_else(|| for_os.first().copied())
        .ok_or_else(|| ResolveError::NoMatchingAsset {
            os: target.os.clone(),
            arch: target.arch.clone(),
        })
}
