//! Supabase row-store backend.
//!
//! Required table (created once in the Supabase SQL editor):
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS cookie_store (
//!   user_id    TEXT PRIMARY KEY,
//!   cookies    JSONB NOT NULL DEFAULT '{}',
//!   updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```
//!
//! Saves use PostgREST's native upsert on the `user_id` primary key.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::SupabaseConfig;
use crate::identity::UserId;
use crate::jar::{CookieJar, prune, utc_now};

use super::http_client::{ensure_success, with_query};
use super::payload::decode_stored_cookies;
use super::{BackendKind, CookieBackend, StoreError};

const BACKEND: BackendKind = BackendKind::Supabase;

/// Stores each user's jar as one Supabase row.
#[derive(Debug, Clone)]
pub struct SupabaseBackend {
    client: Client,
    config: SupabaseConfig,
}

#[derive(Debug, Deserialize)]
struct CookieRow {
    #[serde(default)]
    cookies: Value,
}

#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    user_id: &'a str,
    cookies: &'a CookieJar,
    updated_at: String,
}

impl SupabaseBackend {
    /// Creates a backend using `client` for all requests.
    #[must_use]
    pub fn new(client: Client, config: SupabaseConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.table)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_role_key)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.config.service_role_key),
            )
    }
}

#[async_trait]
impl CookieBackend for SupabaseBackend {
    fn kind(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(level = "debug", skip(self))]
    async fn load(&self, user: &UserId) -> Result<CookieJar, StoreError> {
        let user_filter = format!("eq.{user}");
        let url = with_query(
            BACKEND,
            &self.table_url(),
            &[
                ("select", "cookies"),
                ("user_id", user_filter.as_str()),
                ("limit", "1"),
            ],
        )?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        let rows: Vec<CookieRow> = ensure_success(BACKEND, response)
            .await?
            .json()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;

        let Some(row) = rows.into_iter().next() else {
            debug!("no Supabase row for user; starting empty");
            return Ok(CookieJar::new());
        };
        let jar = decode_stored_cookies(row.cookies)?;
        Ok(prune(jar, utc_now()))
    }

    #[instrument(level = "debug", skip(self, jar))]
    async fn save(&self, jar: &CookieJar, user: &UserId) -> Result<(), StoreError> {
        let now = utc_now();
        let pruned = prune(jar.clone(), now);
        let row = UpsertRow {
            user_id: user.as_str(),
            cookies: &pruned,
            updated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let url = with_query(BACKEND, &self.table_url(), &[("on_conflict", "user_id")])?;
        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        ensure_success(BACKEND, response).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        let user_filter = format!("eq.{user}");
        let url = with_query(BACKEND, &self.table_url(), &[("user_id", user_filter.as_str())])?;
        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        ensure_success(BACKEND, response).await?;
        Ok(())
    }
}
