//! Corrupt or partial stored payloads; assert the store falls back to an
//! empty jar and the next save repairs the file.

use std::fs;
use std::sync::Arc;

use cookie_relay::{CookieBackend, CookieCodec, CookieRecord, CookieStore, FileBackend, UserId};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::fixtures::{file_store, supabase_backend};
use crate::support::socket_guard::start_mock_server_or_skip;

#[tokio::test]
async fn p0_corrupt_plain_file_loads_empty_then_recovers() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    fs::write(&path, b"{\"example.com\": {\"sid\": {\"val").expect("write");

    let backend = FileBackend::new(&path, CookieCodec::plain());
    assert!(backend.load(&UserId::default()).await.expect("load").is_empty());

    let store = file_store(&path, CookieCodec::plain());
    store
        .upsert_record(&UserId::default(), "example.com", "sid", CookieRecord::new("fresh"))
        .await;

    let repaired: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("valid json");
    assert_eq!(repaired["example.com"]["sid"]["value"], "fresh");
}

#[tokio::test]
async fn p0_empty_and_binary_files_load_empty() {
    let temp_dir = TempDir::new().expect("temp dir");
    for (name, contents) in [("empty.json", &b""[..]), ("binary.json", &b"\x00\xff\x13"[..])] {
        let path = temp_dir.path().join(name);
        fs::write(&path, contents).expect("write");
        let store = file_store(&path, CookieCodec::plain());
        assert!(store.load(&UserId::default()).await.is_empty(), "{name}");
    }
}

#[tokio::test]
async fn p0_records_missing_optional_fields_are_tolerated() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    fs::write(
        &path,
        r#"{"a.com":{"x":{"value":"1","path":null},"y":{"value":"2"}},"empty.com":{}}"#,
    )
    .expect("write");

    let jar = file_store(&path, CookieCodec::plain())
        .load(&UserId::default())
        .await;
    assert_eq!(jar.get("a.com", "x").expect("x").path, "/");
    assert_eq!(jar.get("a.com", "y").expect("y").path, "/");
    assert!(jar.domain("empty.com").is_none());
}

#[tokio::test]
async fn p0_malformed_remote_payload_is_empty_at_facade() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/rest/v1/cookie_store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"cookies": "{oops"}])))
        .mount(&server)
        .await;

    let backend = supabase_backend(&server.uri());
    assert!(backend.load(&UserId::new("u-1")).await.is_err());

    let store = CookieStore::new(Arc::new(backend));
    assert!(store.load(&UserId::new("u-1")).await.is_empty());
}
