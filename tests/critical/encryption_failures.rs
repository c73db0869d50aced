//! Wrong key, tampered tag, corrupted envelope; assert clean errors at the
//! adapter, an empty jar at the facade, and no plaintext leak.

use std::fs;

use cookie_relay::{
    CodecError, CookieBackend, CookieCodec, EncryptionEnvelope, FileBackend, StoreError, StoreKey,
    UserId,
};
use tempfile::TempDir;

use crate::support::fixtures::{file_store, live_jar, mixed_jar};

fn encrypted_backend(path: &std::path::Path, secret: &str) -> FileBackend {
    FileBackend::new(path, CookieCodec::from_secret(Some(secret)).expect("codec"))
}

#[tokio::test]
async fn p0_encrypted_round_trip_hides_plaintext() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    let backend = encrypted_backend(&path, "correct horse");
    let user = UserId::default();

    backend.save(&mixed_jar(), &user).await.expect("save");

    let raw = fs::read_to_string(&path).expect("read");
    assert!(!raw.contains("abc123"));
    assert!(!raw.contains("example.com"));
    let envelope: serde_json::Value = serde_json::from_str(&raw).expect("envelope json");
    assert!(envelope["iv"].is_string());
    assert!(envelope["authTag"].is_string());

    assert_eq!(backend.load(&user).await.expect("load"), live_jar());
}

#[tokio::test]
async fn p0_wrong_key_fails_closed() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    encrypted_backend(&path, "key-one")
        .save(&mixed_jar(), &UserId::default())
        .await
        .expect("save");

    let result = encrypted_backend(&path, "key-two")
        .load(&UserId::default())
        .await;
    let err = result.expect_err("wrong key must not decode");
    assert!(matches!(err, StoreError::Codec(CodecError::DecryptionFailed)));
    let msg = err.to_string();
    assert!(!msg.contains("abc123") && !msg.contains("sid"));

    let store = file_store(
        &path,
        CookieCodec::from_secret(Some("key-two")).expect("codec"),
    );
    assert!(store.load(&UserId::default()).await.is_empty());
}

#[tokio::test]
async fn p0_tampered_auth_tag_is_rejected() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    let backend = encrypted_backend(&path, "secret");
    backend
        .save(&mixed_jar(), &UserId::default())
        .await
        .expect("save");

    let mut envelope: EncryptionEnvelope =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("envelope");
    let first = if envelope.auth_tag.starts_with('0') { "1" } else { "0" };
    envelope.auth_tag.replace_range(0..1, first);
    fs::write(&path, serde_json::to_string(&envelope).expect("json")).expect("write");

    assert!(matches!(
        backend.load(&UserId::default()).await,
        Err(StoreError::Codec(CodecError::DecryptionFailed))
    ));
}

#[tokio::test]
async fn p0_plaintext_file_read_with_key_is_error() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    fs::write(&path, r#"{"example.com":{"sid":{"value":"abc123","path":"/"}}}"#).expect("write");

    let result = encrypted_backend(&path, "secret")
        .load(&UserId::default())
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Codec(CodecError::Json(_) | CodecError::InvalidEnvelope))
    ));
}

#[tokio::test]
async fn p0_malformed_envelope_fields_are_invalid() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("cookies.json");
    fs::write(
        &path,
        r#"{"iv":"zz","authTag":"00112233445566778899aabbccddeeff","ciphertext":"00"}"#,
    )
    .expect("write");

    assert!(matches!(
        encrypted_backend(&path, "secret").load(&UserId::default()).await,
        Err(StoreError::Codec(CodecError::InvalidEnvelope))
    ));
}

#[test]
fn p0_envelope_accepts_legacy_data_field() {
    let key = StoreKey::derive("legacy").expect("key");
    let sealed = EncryptionEnvelope::seal(&key, br#"{"a.com":{"x":{"value":"1","path":"/"}}}"#)
        .expect("seal");
    let legacy = serde_json::json!({
        "iv": sealed.iv,
        "authTag": sealed.auth_tag,
        "data": sealed.ciphertext,
    })
    .to_string();

    let jar = CookieCodec::encrypted(key).decode(&legacy).expect("decode");
    assert_eq!(jar.get("a.com", "x").expect("record").value, "1");
}

#[test]
fn p0_same_secret_derives_same_key_across_instances() {
    let first = CookieCodec::from_secret(Some("shared")).expect("codec");
    let second = CookieCodec::from_secret(Some("shared")).expect("codec");
    let encoded = first
        .encode(&live_jar(), chrono::Utc::now())
        .expect("encode");
    assert_eq!(second.decode(&encoded).expect("decode"), live_jar());
}
