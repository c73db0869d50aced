//! Cookie Relay Library
//!
//! Server-side cookie persistence for a browser web proxy. Cookies observed on
//! tunneled responses are parsed, merged into a per-user jar, and stored in
//! exactly one backend chosen at startup, so sessions survive client restarts.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`jar`] - Jar data model and expiry pruning
//! - [`codec`] - JSON serialization with optional AES-256-GCM encryption
//! - [`store`] - Backend adapters (file, Appwrite, Supabase) and the store facade
//! - [`intercept`] - `Set-Cookie` parsing and background persistence
//! - [`identity`] - Maps requests to the user whose jar they touch
//! - [`server`] - Management API
//! - [`config`] - Environment configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod identity;
pub mod intercept;
pub mod jar;
pub mod server;
pub mod store;
pub mod user_agent;

// Re-export commonly used types
pub use codec::{CodecError, CookieCodec, EncryptionEnvelope, StoreKey};
pub use config::{AppwriteConfig, ConfigError, HttpTimeouts, StoreConfig, SupabaseConfig};
pub use identity::{
    DEFAULT_USER, IdentityError, IdentityResolver, SingleUser, SupabaseIdentity, UserId,
};
pub use intercept::{
    DEFAULT_QUEUE_CAPACITY, InterceptionBridge, ObserveSummary, ParsedSetCookie, SetCookieError,
    parse_set_cookie,
};
pub use jar::{CookieJar, CookieRecord, DomainCookies, is_expired, parse_expiry, prune};
pub use server::{ApiError, AppState, build_router, serve};
pub use store::{
    AppwriteBackend, BackendKind, CloudStatus, CookieBackend, CookieStore, FileBackend,
    StoreError, SupabaseBackend, build_store_http_client,
};
