//! Cookie management routes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::info;

use crate::jar::{CookieJar, CookieRecord};

use super::error::ApiError;
use super::{AppState, resolve_user};

/// Body of `POST /api/cookies`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SetCookieBody {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    value: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    expires: Option<String>,
    #[serde(default)]
    http_only: Option<bool>,
    #[serde(default)]
    secure: Option<bool>,
    #[serde(default)]
    same_site: Option<String>,
}

/// Accepts any JSON value for a cookie value, keeping strings as-is and
/// storing numbers and booleans by their JSON text.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

impl SetCookieBody {
    fn into_parts(self) -> Result<(String, String, CookieRecord), ApiError> {
        let domain = self.domain.filter(|domain| !domain.trim().is_empty());
        let name = self.name.filter(|name| !name.trim().is_empty());
        let (Some(domain), Some(name)) = (domain, name) else {
            return Err(ApiError::BadRequest(
                "domain and name are required".to_string(),
            ));
        };

        let mut record = CookieRecord::new(self.value.unwrap_or_default())
            .with_path(self.path.unwrap_or_default());
        record.expires = self.expires.filter(|expires| !expires.trim().is_empty());
        record.http_only = self.http_only;
        record.secure = self.secure;
        record.same_site = self.same_site;
        Ok((domain, name, record))
    }
}

pub(super) async fn list_cookies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CookieJar>, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    Ok(Json(state.store.load(&user).await))
}

pub(super) async fn set_cookie(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SetCookieBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    let Json(body) = body?;
    let (domain, name, record) = body.into_parts()?;
    state.store.upsert_record(&user, &domain, &name, record).await;
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn clear_cookies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    state.store.clear(&user).await;
    info!(user = %user, "cookie jar cleared");
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn delete_cookie(
    State(state): State<AppState>,
    Path((domain, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    state.store.remove_record(&user, &domain, &name).await;
    Ok(Json(json!({ "ok": true })))
}
