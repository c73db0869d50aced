//! Shared HTTP client construction policy for remote stores.
//!
//! Both document-store adapters and the identity resolver use one client built
//! here, so timeout, user-agent, and compression settings stay consistent.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use crate::config::HttpTimeouts;
use crate::user_agent;

use super::{BackendKind, StoreError};

/// Longest response body excerpt kept in [`StoreError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Builds the HTTP client used for remote store calls.
///
/// # Errors
///
/// Returns [`StoreError::Client`] when client construction fails.
pub fn build_store_http_client(
    backend: BackendKind,
    timeouts: HttpTimeouts,
) -> Result<Client, StoreError> {
    debug!(
        backend = %backend,
        connect_timeout_secs = timeouts.connect_secs,
        read_timeout_secs = timeouts.read_secs,
        "building store HTTP client"
    );
    Client::builder()
        .user_agent(user_agent::default_client_user_agent())
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .gzip(true)
        .build()
        .map_err(|error| StoreError::Client {
            backend,
            message: error.to_string(),
        })
}

/// Passes through success responses; turns anything else into [`StoreError::Status`].
pub(crate) async fn ensure_success(
    backend: BackendKind,
    response: Response,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        backend,
        status: status.as_u16(),
        message: truncate_for_error(&body),
    })
}

/// Appends `pairs` to `base` as form-encoded query parameters.
pub(crate) fn with_query(
    backend: BackendKind,
    base: &str,
    pairs: &[(&str, &str)],
) -> Result<Url, StoreError> {
    let mut url = Url::parse(base).map_err(|error| StoreError::Client {
        backend,
        message: format!("invalid store URL {base:?}: {error}"),
    })?;
    url.query_pairs_mut().extend_pairs(pairs);
    Ok(url)
}

fn truncate_for_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut excerpt = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
    excerpt.push_str("...");
    excerpt
}
