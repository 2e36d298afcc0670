//! Helpers for front-ends that turn an inbound request into a [`Query`].
//!
//! [`Query`]: grab_schema::Query

use std::sync::LazyLock;

use grab_schema::LATEST_RELEASE;
use regex::Regex;

use crate::error::ResolveError;

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 :/.]").expect("valid sanitize regex"));

/// Fallbacks and overrides applied while parsing a request path.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    /// Owner used when the path names only a program.
    pub user: String,
    /// When set, replaces whatever owner the path names.
    pub force_user: String,
    /// When set, replaces whatever program the path names.
    pub force_repo: String,
}

/// `user/program@release`, split into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub user: String,
    pub program: String,
    pub release: String,
}

/// Parse `[user/]program[@release]`.
///
/// A leading `/` is ignored. Without a `/` the whole text is the program and
/// `defaults.user` is the owner. A missing release becomes `latest`.
///
/// # Errors
///
/// [`ResolveError::Config`] when no program can be determined.
///
/// # Example
///
/// ```
/// use grab_core::request::{RequestDefaults, parse_target};
///
/// let defaults = RequestDefaults { user: "acme".into(), ..Default::default() };
/// let r = parse_target("/serve@1.9.0", &defaults).unwrap();
/// assert_eq!((r.user.as_str(), r.program.as_str(), r.release.as_str()), ("acme", "serve", "1.9.0"));
/// ```
pub fn parse_target(path: &str, defaults: &RequestDefaults) -> Result<RepoRef, ResolveError> {
    let path = path.trim().trim_start_matches('/');

    let (user, rest) = match path.split_once('/') {
        Some((user, rest)) => (user.to_string(), rest),
        None => (defaults.user.clone(), path),
    };
    let (program, release) = rest.split_once('@').unwrap_or((rest, ""));

    let user = if defaults.force_user.is_empty() {
        user
    } else {
        defaults.force_user.clone()
    };
    let program = if defaults.force_repo.is_empty() {
        program.to_string()
    } else {
        defaults.force_repo.clone()
    };
    let release = if release.is_empty() {
        LATEST_RELEASE.to_string()
    } else {
        release.to_string()
    };

    if program.is_empty() {
        return Err(ResolveError::Config(format!("invalid path: {path:?}")));
    }

    Ok(RepoRef {
        user,
        program,
        release,
    })
}

/// The token of an `Authorization: Bearer <token>` header value, if any.
pub fn token_from_authorization(header: &str) -> Option<&str> {
    header
        .split_once("Bearer ")
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

/// Strip everything but letters, digits, space, `:`, `/` and `.` from a
/// user-facing message, so it can be echoed inside a generated script.
pub fn sanitize_message(message: &str) -> String {
    UNSAFE_CHARS_RE.replace_all(message, "").into_owned()
}
