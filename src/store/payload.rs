//! Decoding of the cookie field stored by the document-store backends.
//!
//! Appwrite keeps the jar as JSON text in a string attribute; Supabase keeps it
//! as a JSONB object. Rows written by other tools may use either form, so both
//! adapters accept both.

use serde_json::Value;

use crate::jar::CookieJar;

use super::StoreError;

/// Decodes a stored cookie field that is either a JSON object or JSON text.
///
/// `null` and empty strings decode to an empty jar.
pub(crate) fn decode_stored_cookies(field: Value) -> Result<CookieJar, StoreError> {
    match field {
        Value::Null => Ok(CookieJar::new()),
        Value::String(text) if text.trim().is_empty() => Ok(CookieJar::new()),
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Ok(serde_json::from_value(other)?),
    }
}
