//! GET-and-decode helper shared by every forge adapter.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ResolveError;

/// Append `segments` to the path of `base`, percent-encoding each one.
///
/// A segment containing `/` stays a single segment (`%2F`), so tags such as
/// `release/1.0` and GitLab project paths address the right endpoint.
pub(crate) fn api_url(base: &str, segments: &[&str]) -> Result<String, ResolveError> {
    let mut url =
        Url::parse(base).map_err(|e| ResolveError::Config(format!("invalid base URL {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ResolveError::Config(format!("base URL cannot carry a path: {base:?}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

/// Issue a GET and decode a 200 response as JSON.
///
/// 404 maps to [`ResolveError::NotFound`]; any other non-200 status maps to
/// [`ResolveError::Upstream`] with the reason phrase and the response body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    accept: &str,
    authorization: Option<String>,
) -> Result<T, ResolveError> {
    debug!(%url, "GET");

    let mut request = client.get(url).header(ACCEPT, accept);
    if let Some(value) = authorization {
        request = request.header(AUTHORIZATION, value);
    }

    let resp = request
        .send()
        .await
        .map_err(|source| ResolveError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ResolveError::NotFound {
            url: url.to_string(),
        });
    }
    if status != StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        return Err(ResolveError::Upstream {
            status: status
                .canonical_reason()
                .unwrap_or(status.as_str())
                .to_string(),
            body,
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|source| ResolveError::Transport {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ResolveError::Serialization {
        url: url.to_string(),
        source,
    })
}
