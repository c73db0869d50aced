//! User identity resolution for the management API.
//!
//! Single-user deployments scope every jar to [`DEFAULT_USER`]. Multi-user
//! deployments verify a bearer token against the Supabase auth endpoint and
//! use the returned user id. Token issuance is handled elsewhere.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::SupabaseConfig;

/// Fallback user id for unauthenticated / single-user deployments.
pub const DEFAULT_USER: &str = "_default";

/// Opaque key scoping one cookie jar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new(DEFAULT_USER)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from identity resolution.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No bearer token was supplied.
    #[error("missing bearer token")]
    MissingToken,
    /// The auth service rejected the token.
    #[error("bearer token was rejected")]
    Rejected,
    /// The auth service could not be reached.
    #[error("identity service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    /// The auth service answered with a server error or a rate limit.
    #[error("identity service returned HTTP {0}")]
    UpstreamStatus(u16),
}

/// Maps an (optional) bearer token to the user whose jar a request touches.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves the user for a request.
    async fn resolve(&self, bearer: Option<&str>) -> Result<UserId, IdentityError>;
}

/// Resolver that ignores credentials and always returns [`DEFAULT_USER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleUser;

#[async_trait]
impl IdentityResolver for SingleUser {
    async fn resolve(&self, _bearer: Option<&str>) -> Result<UserId, IdentityError> {
        Ok(UserId::default())
    }
}

/// Resolver that verifies bearer tokens with Supabase auth.
#[derive(Debug, Clone)]
pub struct SupabaseIdentity {
    client: Client,
    user_endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
}

impl SupabaseIdentity {
    /// Creates a resolver using an existing HTTP client.
    #[must_use]
    pub fn new(client: Client, config: &SupabaseConfig) -> Self {
        Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", config.url.trim_end_matches('/')),
            api_key: config.service_role_key.clone(),
        }
    }
}

#[async_trait]
impl IdentityResolver for SupabaseIdentity {
    #[instrument(level = "debug", skip_all)]
    async fn resolve(&self, bearer: Option<&str>) -> Result<UserId, IdentityError> {
        let token = bearer
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(IdentityError::MissingToken)?;

        let response = self
            .client
            .get(&self.user_endpoint)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            warn!(status = %status, "Identity service is failing; cannot verify bearer token");
            return Err(IdentityError::UpstreamStatus(status.as_u16()));
        }
        if !status.is_success() {
            debug!(status = %status, "Identity service rejected bearer token");
            return Err(IdentityError::Rejected);
        }

        let user: SupabaseUser = response.json().await.map_err(|error| {
            warn!(error = %error, "Identity service returned an unexpected body");
            IdentityError::Rejected
        })?;
        if user.id.trim().is_empty() {
            return Err(IdentityError::Rejected);
        }
        Ok(UserId::new(user.id))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}
