//! Builders for stores, configs, and jars used across integration tests.

use std::path::Path;
use std::sync::Arc;

use cookie_relay::{
    AppwriteBackend, AppwriteConfig, CookieCodec, CookieJar, CookieRecord, CookieStore,
    FileBackend, SupabaseBackend, SupabaseConfig,
};

/// Expiry far enough ahead that pruning never removes it.
pub const FAR_FUTURE: &str = "2099-01-01T00:00:00Z";

/// Expiry that is always in the past.
pub const LONG_AGO: &str = "2000-01-01T00:00:00Z";

pub fn appwrite_config(server_uri: &str) -> AppwriteConfig {
    AppwriteConfig {
        endpoint: format!("{server_uri}/v1"),
        project_id: "proj-1".to_string(),
        api_key: "aw-secret-key".to_string(),
        database_id: "cookie_relay".to_string(),
        collection_id: "cookie_store".to_string(),
    }
}

pub fn supabase_config(server_uri: &str) -> SupabaseConfig {
    SupabaseConfig {
        url: server_uri.to_string(),
        service_role_key: "sb-service-role".to_string(),
        table: "cookie_store".to_string(),
    }
}

pub fn appwrite_backend(server_uri: &str) -> AppwriteBackend {
    AppwriteBackend::new(reqwest::Client::new(), appwrite_config(server_uri))
}

pub fn supabase_backend(server_uri: &str) -> SupabaseBackend {
    SupabaseBackend::new(reqwest::Client::new(), supabase_config(server_uri))
}

pub fn file_store(path: &Path, codec: CookieCodec) -> CookieStore {
    CookieStore::new(Arc::new(FileBackend::new(path, codec)))
}

/// Jar with one long-lived session cookie and one expired cookie.
pub fn mixed_jar() -> CookieJar {
    let mut jar = CookieJar::new();
    let mut session = CookieRecord::new("abc123")
        .with_path("/app")
        .with_expires(FAR_FUTURE);
    session.http_only = Some(true);
    session.secure = Some(true);
    session.same_site = Some("Lax".to_string());
    jar.insert("example.com", "sid", session);
    jar.insert("stale.test", "old", CookieRecord::new("gone").with_expires(LONG_AGO));
    jar
}

/// `mixed_jar` after pruning.
pub fn live_jar() -> CookieJar {
    let mut jar = mixed_jar();
    jar.remove("stale.test", "old");
    jar
}
