//! Appwrite document-store backend.
//!
//! One document per user in a fixed collection, with attributes:
//! - `user_id` (string, unique)
//! - `cookies` (string, JSON-serialized jar)
//! - `updated_at` (datetime)
//!
//! Save is a read-then-write upsert (list by `user_id`, then update or
//! create). It is not atomic against concurrent writers for the same user;
//! the last write wins.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::AppwriteConfig;
use crate::identity::UserId;
use crate::jar::{CookieJar, prune, utc_now};

use super::http_client::{ensure_success, with_query};
use super::payload::decode_stored_cookies;
use super::{BackendKind, CookieBackend, StoreError};

const BACKEND: BackendKind = BackendKind::Appwrite;

/// Stores each user's jar as one Appwrite document.
#[derive(Debug, Clone)]
pub struct AppwriteBackend {
    client: Client,
    config: AppwriteConfig,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<CookieDocument>,
}

#[derive(Debug, Deserialize)]
struct CookieDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    cookies: Value,
}

#[derive(Debug, Serialize)]
struct DocumentData<'a> {
    user_id: &'a str,
    cookies: String,
    updated_at: String,
}

impl AppwriteBackend {
    /// Creates a backend using `client` for all requests.
    #[must_use]
    pub fn new(client: Client, config: AppwriteConfig) -> Self {
        Self { client, config }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.config.database_id),
            urlencoding::encode(&self.config.collection_id),
        )
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(document_id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("X-Appwrite-Key", &self.config.api_key)
    }

    async fn find_document(&self, user: &UserId) -> Result<Option<CookieDocument>, StoreError> {
        let equal = json!({
            "method": "equal",
            "attribute": "user_id",
            "values": [user.as_str()],
        })
        .to_string();
        let limit = json!({ "method": "limit", "values": [1] }).to_string();

        let url = with_query(
            BACKEND,
            &self.documents_url(),
            &[("queries[]", equal.as_str()), ("queries[]", limit.as_str())],
        )?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        let list: DocumentList = ensure_success(BACKEND, response)
            .await?
            .json()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        Ok(list.documents.into_iter().next())
    }
}

#[async_trait]
impl CookieBackend for AppwriteBackend {
    fn kind(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(level = "debug", skip(self))]
    async fn load(&self, user: &UserId) -> Result<CookieJar, StoreError> {
        let Some(document) = self.find_document(user).await? else {
            debug!("no Appwrite document for user; starting empty");
            return Ok(CookieJar::new());
        };
        let jar = decode_stored_cookies(document.cookies)?;
        Ok(prune(jar, utc_now()))
    }

    #[instrument(level = "debug", skip(self, jar))]
    async fn save(&self, jar: &CookieJar, user: &UserId) -> Result<(), StoreError> {
        let now = utc_now();
        let pruned = prune(jar.clone(), now);
        let data = DocumentData {
            user_id: user.as_str(),
            cookies: serde_json::to_string(&pruned)?,
            updated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let request = match self.find_document(user).await? {
            Some(existing) => {
                debug!(document_id = %existing.id, "updating Appwrite cookie document");
                self.client
                    .patch(self.document_url(&existing.id))
                    .json(&json!({ "data": data }))
            }
            None => {
                debug!("creating Appwrite cookie document");
                self.client.post(self.documents_url()).json(&json!({
                    "documentId": "unique()",
                    "data": data,
                }))
            }
        };

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        ensure_success(BACKEND, response).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        let Some(existing) = self.find_document(user).await? else {
            return Ok(());
        };

        let response = self
            .authorized(self.client.delete(self.document_url(&existing.id)))
            .send()
            .await
            .map_err(|error| StoreError::http(BACKEND, error))?;
        ensure_success(BACKEND, response).await?;
        Ok(())
    }
}
