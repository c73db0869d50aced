//! `Set-Cookie` header parsing.
//!
//! Parsing is deliberately lenient: the first segment must be `name=value`
//! (split on the first `=`), attributes are matched case-insensitively, and
//! anything unrecognised (including `Domain` and `Max-Age`) is ignored.

use chrono::SecondsFormat;

use crate::jar::{CookieRecord, parse_expiry};

/// Errors for a single `Set-Cookie` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetCookieError {
    /// The leading `name=value` pair has no `=`.
    #[error("set-cookie value has no name=value pair")]
    MissingPair,
    /// The cookie name is empty.
    #[error("set-cookie value has an empty cookie name")]
    EmptyName,
}

/// A parsed `Set-Cookie` value ready to merge into a jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSetCookie {
    /// Cookie name.
    pub name: String,
    /// Value and attributes.
    pub record: CookieRecord,
}

/// Parses one raw `Set-Cookie` header value.
///
/// `Expires` values that parse as a date are normalised to RFC 3339 UTC;
/// anything else is kept verbatim and never expires during pruning.
///
/// # Errors
///
/// Returns [`SetCookieError`] when the leading segment is not `name=value`
/// or the name is empty.
pub fn parse_set_cookie(raw: &str) -> Result<ParsedSetCookie, SetCookieError> {
    let mut segments = raw.split(';').map(str::trim);
    let pair = segments.next().unwrap_or_default();
    let (name, value) = pair.split_once('=').ok_or(SetCookieError::MissingPair)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SetCookieError::EmptyName);
    }

    let mut record = CookieRecord::new(value.trim());
    for attribute in segments {
        let lower = attribute.to_ascii_lowercase();
        if lower.starts_with("path=") {
            record = record.with_path(&attribute["path=".len()..]);
        } else if lower.starts_with("expires=") {
            record.expires = Some(normalize_expires(&attribute["expires=".len()..]));
        } else if lower == "httponly" {
            record.http_only = Some(true);
        } else if lower == "secure" {
            record.secure = Some(true);
        } else if lower.starts_with("samesite=") {
            record.same_site = Some(attribute["samesite=".len()..].to_string());
        }
    }

    Ok(ParsedSetCookie {
        name: name.to_string(),
        record,
    })
}

fn normalize_expires(raw: &str) -> String {
    let raw = raw.trim();
    parse_expiry(raw).map_or_else(
        || raw.to_string(),
        |instant| instant.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
