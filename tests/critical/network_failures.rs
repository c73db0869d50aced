//! Unreachable, failing, and slow remote stores; assert every facade
//! operation completes with its safe default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cookie_relay::{
    BackendKind, CookieBackend, CookieRecord, CookieStore, HttpTimeouts, StoreError,
    SupabaseBackend, UserId, build_store_http_client,
};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use crate::support::fixtures::{appwrite_backend, live_jar, supabase_backend, supabase_config};
use crate::support::socket_guard::start_mock_server_or_skip;

/// A local port with nothing listening on it.
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn p0_unreachable_store_yields_safe_defaults() {
    let uri = closed_port_uri();
    let user = UserId::new("u-1");

    let backend = supabase_backend(&uri);
    let err = backend.load(&user).await.expect_err("connection refused");
    assert!(err.is_transient());

    for store in [
        CookieStore::new(Arc::new(supabase_backend(&uri))),
        CookieStore::new(Arc::new(appwrite_backend(&uri))),
    ] {
        assert!(store.load(&user).await.is_empty());
        store.save(&live_jar(), &user).await;
        store.clear(&user).await;
        store
            .upsert_record(&user, "a.com", "x", CookieRecord::new("1"))
            .await;
        store.remove_record(&user, "a.com", "x").await;
    }
}

#[tokio::test]
async fn p0_server_errors_are_status_errors() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let backend = supabase_backend(&server.uri());
    let err = backend.load(&UserId::new("u-1")).await.expect_err("503");
    assert!(matches!(
        err,
        StoreError::Status {
            backend: BackendKind::Supabase,
            status: 503,
            ..
        }
    ));
    assert!(err.is_transient());

    let err = backend
        .save(&live_jar(), &UserId::new("u-1"))
        .await
        .expect_err("500");
    assert!(matches!(err, StoreError::Status { status: 500, .. }));
}

#[tokio::test]
async fn p0_auth_failures_are_not_transient() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = supabase_backend(&server.uri())
        .load(&UserId::new("u-1"))
        .await
        .expect_err("403");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn p0_slow_store_hits_read_timeout() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = build_store_http_client(
        BackendKind::Supabase,
        HttpTimeouts {
            connect_secs: 1,
            read_secs: 1,
        },
    )
    .expect("client");
    let store = CookieStore::new(Arc::new(SupabaseBackend::new(
        client,
        supabase_config(&server.uri()),
    )));

    let started = Instant::now();
    assert!(store.load(&UserId::new("u-1")).await.is_empty());
    assert!(started.elapsed() < Duration::from_secs(4));
}
