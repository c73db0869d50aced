//! Status, keep-alive, and tunnel bootstrap routes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::intercept::{ObserveSummary, response_domain};
use crate::jar::utc_now;
use crate::store::CloudStatus;
use crate::user_agent::random_browser_user_agent;

use super::error::ApiError;
use super::{AppState, resolve_user};

pub(super) async fn heartbeat() -> Json<Value> {
    Json(json!({ "ok": true, "time": unix_millis() }))
}

pub(super) async fn user_agent() -> Json<Value> {
    Json(json!({ "userAgent": random_browser_user_agent() }))
}

pub(super) async fn cloud_status(State(state): State<AppState>) -> Json<CloudStatus> {
    Json(state.store.status())
}

/// Serves `let _CONFIG = {wispurl, bareurl};` for the page's tunnel client.
pub(super) async fn tunnel_config(headers: HeaderMap) -> impl IntoResponse {
    let (proto, host) = public_origin(&headers);
    let ws_proto = if proto == "https" { "wss" } else { "ws" };
    let config = json!({
        "wispurl": format!("{ws_proto}://{host}/wisp/"),
        "bareurl": format!("{proto}://{host}/bare/"),
    });
    (
        [(CONTENT_TYPE, "application/javascript; charset=utf-8")],
        format!("let _CONFIG = {config};"),
    )
}

/// Body of `POST /api/intercept`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InterceptBody {
    url: String,
    #[serde(default)]
    set_cookie: Vec<String>,
}

/// Hands `Set-Cookie` values observed by an out-of-process tunnel client to
/// the bridge; answers before anything is persisted.
pub(super) async fn intercept(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<InterceptBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let user = resolve_user(&state, &headers).await?;
    let Json(body) = body?;
    let Some(domain) = response_domain(&body.url) else {
        return Err(ApiError::BadRequest(
            "url must be an absolute URL with a host".to_string(),
        ));
    };

    let ObserveSummary {
        queued,
        skipped,
        dropped,
    } = state
        .bridge
        .observe_set_cookies(&user, &domain, &body.set_cookie);
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "ok": true,
            "queued": queued,
            "skipped": skipped,
            "dropped": dropped,
        })),
    ))
}

/// Scheme and host the browser used to reach us, honouring reverse proxies.
fn public_origin(headers: &HeaderMap) -> (String, String) {
    let first = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let proto = first("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = first("x-forwarded-host")
        .or_else(|| first(HOST.as_str()))
        .unwrap_or_else(|| "localhost".to_string());
    (proto, host)
}

fn unix_millis() -> i64 {
    utc_now().timestamp_millis()
}
