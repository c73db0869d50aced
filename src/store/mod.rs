//! Cookie persistence backends and the store facade.
//!
//! # Architecture
//!
//! - [`CookieBackend`] - async trait with `load`/`save`/`clear` per user
//! - [`FileBackend`] - single local file, optionally encrypted
//! - [`AppwriteBackend`] - one Appwrite document per user
//! - [`SupabaseBackend`] - one Supabase row per user
//! - [`CookieStore`] - facade over exactly one backend, chosen at startup
//!
//! Backends report failures as [`StoreError`]. The facade turns every failure
//! into the safe default (empty jar on load, no-op on save/clear) and logs it,
//! so persistence problems never reach a caller as an error.

mod appwrite;
mod facade;
mod file;
mod http_client;
mod payload;
mod supabase;

pub use appwrite::AppwriteBackend;
pub use facade::{CloudStatus, CookieStore};
pub use file::FileBackend;
pub use http_client::build_store_http_client;
pub use supabase::SupabaseBackend;

use std::fmt;

use async_trait::async_trait;

use crate::codec::CodecError;
use crate::identity::UserId;
use crate::jar::CookieJar;

/// Which physical store backs the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Local file at a configured path.
    File,
    /// Appwrite document store.
    Appwrite,
    /// Supabase row store.
    Supabase,
}

impl BackendKind {
    /// Stable lowercase label used in logs and status output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Appwrite => "appwrite",
            Self::Supabase => "supabase",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by backend adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("cookie store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Stored payload could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Stored cookie field is not a valid jar.
    #[error("stored cookie payload is malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// Transport-level failure (connect, timeout, body read).
    #[error("{backend} request failed: {source}")]
    Http {
        /// Backend that issued the request.
        backend: BackendKind,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Remote store answered with a non-success status.
    #[error("{backend} returned HTTP {status}: {message}")]
    Status {
        /// Backend that issued the request.
        backend: BackendKind,
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },
    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client for {backend}: {message}")]
    Client {
        /// Backend the client was for.
        backend: BackendKind,
        /// Builder error text.
        message: String,
    },
}

impl StoreError {
    pub(crate) fn http(backend: BackendKind, source: reqwest::Error) -> Self {
        Self::Http { backend, source }
    }

    /// Returns true for failures caused by the network or the remote service
    /// rather than by stored data.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Io(_) | Self::Client { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Codec(_) | Self::Json(_) => false,
        }
    }
}

/// Storage-technology-specific persistence of one jar per user.
///
/// Implementations prune expired records on every load and before every
/// save. `save` replaces the stored jar; merging is the facade's job.
#[async_trait]
pub trait CookieBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Loads the jar for `user`; a user with nothing stored gets an empty jar.
    async fn load(&self, user: &UserId) -> Result<CookieJar, StoreError>;

    /// Replaces the stored jar for `user`.
    async fn save(&self, jar: &CookieJar, user: &UserId) -> Result<(), StoreError>;

    /// Removes everything stored for `user`; absence is not an error.
    async fn clear(&self, user: &UserId) -> Result<(), StoreError>;
}
