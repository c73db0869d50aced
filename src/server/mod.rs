//! Management API served next to the tunnel.
//!
//! Routes:
//! - `GET|POST|DELETE /api/cookies`
//! - `DELETE /api/cookies/{domain}/{name}`
//! - `POST /api/intercept`
//! - `GET /api/cloud-status`, `GET /api/heartbeat`, `GET /api/useragent`
//! - `GET /config.js`
//!
//! Every response carries the cross-origin isolation headers the tunnel's
//! shared-memory transports need.

mod cookies;
mod error;
mod misc;

pub use error::ApiError;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::identity::{IdentityResolver, UserId, bearer_token};
use crate::intercept::InterceptionBridge;
use crate::store::CookieStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    store: CookieStore,
    identity: Arc<dyn IdentityResolver>,
    bridge: InterceptionBridge,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Bundles the store, the identity resolver, and the interception bridge.
    #[must_use]
    pub fn new(
        store: CookieStore,
        identity: Arc<dyn IdentityResolver>,
        bridge: InterceptionBridge,
    ) -> Self {
        Self {
            store,
            identity,
            bridge,
        }
    }
}

/// Builds the router with tracing and cross-origin isolation layers.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/cookies",
            get(cookies::list_cookies)
                .post(cookies::set_cookie)
                .delete(cookies::clear_cookies),
        )
        .route("/cookies/:domain/:name", delete(cookies::delete_cookie))
        .route("/intercept", post(misc::intercept))
        .route("/cloud-status", get(misc::cloud_status))
        .route("/heartbeat", get(misc::heartbeat))
        .route("/useragent", get(misc::user_agent));

    Router::new()
        .nest("/api", api)
        .route("/config.js", get(misc::tunnel_config))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-embedder-policy"),
            HeaderValue::from_static("require-corp"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Serves the management API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an I/O error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!(%address, "management API listening");
    }
    axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);
    Ok(state.identity.resolve(bearer).await?)
}
