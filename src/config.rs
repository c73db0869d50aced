//! Store configuration resolved once at process start.
//!
//! Backend selection is deterministic: Appwrite when both of its settings are
//! present, otherwise Supabase when both of its settings are present,
//! otherwise the local file. The resolved [`StoreConfig`] is passed to
//! [`crate::store::CookieStore::from_config`]; nothing reads the environment
//! after startup.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::store::BackendKind;

/// Default file backend location (relative to the working directory).
pub const DEFAULT_STORE_PATH: &str = ".cookies.json";
/// Default Appwrite API endpoint.
pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
/// Default Appwrite database id.
pub const DEFAULT_APPWRITE_DATABASE_ID: &str = "cookie_relay";
/// Default Appwrite collection id.
pub const DEFAULT_APPWRITE_COLLECTION_ID: &str = "cookie_store";
/// Default Supabase table.
pub const DEFAULT_SUPABASE_TABLE: &str = "cookie_store";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Errors for invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric setting could not be parsed or is out of range.
    #[error("invalid value for {name}: '{value}' (expected whole seconds in 1..={max})")]
    InvalidTimeout {
        /// Environment variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Largest accepted value.
        max: u64,
    },
}

/// Appwrite document-store settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AppwriteConfig {
    /// API endpoint including the `/v1` suffix.
    pub endpoint: String,
    /// Project id (`X-Appwrite-Project`).
    pub project_id: String,
    /// Server API key (`X-Appwrite-Key`).
    pub api_key: String,
    /// Database holding the cookie collection.
    pub database_id: String,
    /// Collection with one document per user.
    pub collection_id: String,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("collection_id", &self.collection_id)
            .finish()
    }
}

/// Supabase row-store settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL (`https://<ref>.supabase.co`).
    pub url: String,
    /// Service role key used for PostgREST and auth calls.
    pub service_role_key: String,
    /// Table with one row per user.
    pub table: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

/// Network timeouts for remote store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout in seconds.
    pub connect_secs: u64,
    /// Per-read timeout in seconds.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Everything needed to build the cookie store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// File backend path.
    pub file_path: PathBuf,
    /// Secret enabling file encryption.
    pub store_key: Option<String>,
    /// Appwrite settings, when both required variables are set.
    pub appwrite: Option<AppwriteConfig>,
    /// Supabase settings, when both required variables are set.
    pub supabase: Option<SupabaseConfig>,
    /// Remote store timeouts.
    pub timeouts: HttpTimeouts,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("file_path", &self.file_path)
            .field("store_key", &self.store_key.as_ref().map(|_| "[REDACTED]"))
            .field("appwrite", &self.appwrite)
            .field("supabase", &self.supabase)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_STORE_PATH),
            store_key: None,
            appwrite: None,
            supabase: None,
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl StoreConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a timeout variable is not a valid number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a timeout variable is not a valid number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let appwrite = match (get("APPWRITE_PROJECT_ID"), get("APPWRITE_API_KEY")) {
            (Some(project_id), Some(api_key)) => Some(AppwriteConfig {
                endpoint: get("APPWRITE_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string()),
                project_id,
                api_key,
                database_id: get("APPWRITE_DATABASE_ID")
                    .unwrap_or_else(|| DEFAULT_APPWRITE_DATABASE_ID.to_string()),
                collection_id: get("APPWRITE_COLLECTION_ID")
                    .unwrap_or_else(|| DEFAULT_APPWRITE_COLLECTION_ID.to_string()),
            }),
            _ => None,
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url,
                service_role_key,
                table: get("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_SUPABASE_TABLE.to_string()),
            }),
            _ => None,
        };

        let timeouts = HttpTimeouts {
            connect_secs: parse_timeout(
                "STORE_CONNECT_TIMEOUT_SECS",
                get("STORE_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
            read_secs: parse_timeout(
                "STORE_READ_TIMEOUT_SECS",
                get("STORE_READ_TIMEOUT_SECS"),
                DEFAULT_READ_TIMEOUT_SECS,
            )?,
        };

        Ok(Self {
            file_path: get("COOKIE_STORE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from),
            store_key: get("STORE_KEY"),
            appwrite,
            supabase,
            timeouts,
        })
    }

    /// Overrides the file backend path.
    #[must_use]
    pub fn with_file_path(mut self, file_path: impl Into<PathBuf>) -> Self {
        self.file_path = file_path.into();
        self
    }

    /// The backend this configuration selects.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        if self.appwrite.is_some() {
            BackendKind::Appwrite
        } else if self.supabase.is_some() {
            BackendKind::Supabase
        } else {
            BackendKind::File
        }
    }
}

fn parse_timeout(name: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<u64>() {
        Ok(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout {
            name,
            value,
            max: MAX_TIMEOUT_SECS,
        }),
    }
}
