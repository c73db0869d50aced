//! Secrets and cookie values must never appear in Debug output or errors.

use cookie_relay::{
    AppwriteConfig, CookieCodec, CookieRecord, StoreConfig, StoreKey, parse_set_cookie,
};

use crate::support::fixtures::supabase_config;

#[test]
fn p0_cookie_record_debug_redacts_value() {
    let record = CookieRecord::new("super-secret-session");
    let debug = format!("{record:?}");
    assert!(!debug.contains("super-secret-session"));

    let parsed = parse_set_cookie("sid=another-secret; Path=/").expect("parse");
    assert!(!format!("{parsed:?}").contains("another-secret"));
}

#[test]
fn p0_config_debug_redacts_keys() {
    let config = StoreConfig {
        store_key: Some("file-secret".to_string()),
        appwrite: Some(AppwriteConfig {
            endpoint: "https://aw.example.test/v1".to_string(),
            project_id: "proj".to_string(),
            api_key: "aw-api-secret".to_string(),
            database_id: "db".to_string(),
            collection_id: "c".to_string(),
        }),
        supabase: Some(supabase_config("https://sb.example.test")),
        ..StoreConfig::default()
    };
    let debug = format!("{config:?}");
    for secret in ["file-secret", "aw-api-secret", "sb-service-role"] {
        assert!(!debug.contains(secret), "{secret} leaked in {debug}");
    }
}

#[test]
fn p0_key_and_codec_debug_redact_material() {
    let key = StoreKey::derive("derive-me").expect("key");
    assert_eq!(format!("{key:?}"), "StoreKey([REDACTED])");
    let codec = CookieCodec::encrypted(key);
    assert!(format!("{codec:?}").contains("REDACTED"));
}
