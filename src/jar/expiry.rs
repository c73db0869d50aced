//! Expiry parsing and pruning.
//!
//! [`prune`] is a pure function of the jar and a fixed instant. Every backend
//! runs it on load and again before save, so no expired record survives more
//! than one round trip.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{CookieJar, CookieRecord};

/// Netscape-style cookie date (`Wed, 21-Oct-2026 07:28:00 GMT`), which
/// `httpdate` does not accept.
const NETSCAPE_DATE_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// Parses a stored or captured expiry value into a UTC instant.
///
/// Accepts RFC 3339 / ISO-8601 timestamps, timezone-less ISO timestamps and
/// bare dates (read as UTC), RFC 7231 HTTP dates, and the Netscape cookie
/// date form. Returns `None` for anything else.
#[must_use]
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }
    if let Ok(parsed) = httpdate::parse_http_date(raw) {
        return Some(DateTime::<Utc>::from(parsed));
    }
    NaiveDateTime::parse_from_str(raw, NETSCAPE_DATE_FORMAT)
        .ok()
        .map(|parsed| parsed.and_utc())
}

/// Returns true when the record's expiry parses to an instant strictly before `now`.
///
/// Records without an expiry (session cookies) and records whose expiry
/// cannot be parsed are never considered expired.
#[must_use]
pub fn is_expired(record: &CookieRecord, now: DateTime<Utc>) -> bool {
    record
        .expires
        .as_deref()
        .and_then(parse_expiry)
        .is_some_and(|expires| expires < now)
}

/// Drops expired records, then drops any domain left without records.
///
/// Idempotent for a fixed `now`: `prune(prune(j, t), t) == prune(j, t)`.
#[must_use]
pub fn prune(jar: CookieJar, now: DateTime<Utc>) -> CookieJar {
    let domains = jar
        .into_domains()
        .into_iter()
        .filter_map(|(domain, names)| {
            let kept = names
                .into_iter()
                .filter(|(_, record)| !is_expired(record, now))
                .collect::<super::DomainCookies>();
            (!kept.is_empty()).then_some((domain, kept))
        })
        .collect();
    CookieJar::from_domains(domains)
}

/// Current wall-clock time as a UTC instant.
pub(crate) fn utc_now() -> DateTime<Utc> {
    Utc::now()
}
