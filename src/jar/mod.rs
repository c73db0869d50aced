//! Cookie jar data model.
//!
//! A [`CookieJar`] maps a domain (host name, case-sensitive as captured) to the
//! cookies stored for it, keyed by cookie name. Serialized form is the plain
//! JSON object `{domain: {name: CookieRecord}}` used by every backend.

mod expiry;

pub use expiry::{is_expired, parse_expiry, prune};
pub(crate) use expiry::utc_now;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Path used when a cookie does not carry one.
pub const DEFAULT_COOKIE_PATH: &str = "/";

/// One stored cookie's value and attributes.
///
/// The value field is redacted in Debug output to prevent accidental logging
/// of session credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    /// Cookie value (sensitive, never log).
    #[serde(default, deserialize_with = "string_or_empty")]
    pub value: String,
    /// URL path scope.
    #[serde(default = "default_path", deserialize_with = "path_or_default")]
    pub path: String,
    /// Expiry timestamp (ISO-8601 preferred, HTTP-date tolerated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// `HttpOnly` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Secure` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `SameSite` policy as captured (`Lax`, `Strict`, `None`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl CookieRecord {
    /// Creates a record with the default path and no attributes.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            path: default_path(),
            expires: None,
            http_only: None,
            secure: None,
            same_site: None,
        }
    }

    /// Sets the expiry timestamp.
    #[must_use]
    pub fn with_expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Sets the path, falling back to `/` when blank.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.trim().is_empty() {
            default_path()
        } else {
            path
        };
        self
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("value", &"[REDACTED]")
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}

fn default_path() -> String {
    DEFAULT_COOKIE_PATH.to_string()
}

fn path_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let path = Option::<String>::deserialize(deserializer)?;
    Ok(path
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(default_path))
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Cookies stored for one domain, keyed by cookie name.
pub type DomainCookies = BTreeMap<String, CookieRecord>;

/// The full set of stored cookies for one user.
///
/// Mutations through [`CookieJar::remove`] never leave a domain mapped to an
/// empty record set. Deserialized jars may briefly violate that until they
/// pass through [`prune`], which every backend applies on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    domains: BTreeMap<String, DomainCookies>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the jar holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.values().all(BTreeMap::is_empty)
    }

    /// Total number of records across all domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    /// Number of domains with at least one record.
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.values().filter(|names| !names.is_empty()).count()
    }

    /// Returns a single record.
    #[must_use]
    pub fn get(&self, domain: &str, name: &str) -> Option<&CookieRecord> {
        self.domains.get(domain)?.get(name)
    }

    /// Returns all records for a domain.
    #[must_use]
    pub fn domain(&self, domain: &str) -> Option<&DomainCookies> {
        self.domains.get(domain)
    }

    /// Adds or overwrites the record stored under `domain` + `name`.
    ///
    /// Returns the previous record when one was replaced.
    pub fn insert(
        &mut self,
        domain: impl Into<String>,
        name: impl Into<String>,
        record: CookieRecord,
    ) -> Option<CookieRecord> {
        self.domains
            .entry(domain.into())
            .or_default()
            .insert(name.into(), record)
    }

    /// Removes one record, dropping the domain when it becomes empty.
    ///
    /// Removing a record that does not exist is a no-op returning `None`.
    pub fn remove(&mut self, domain: &str, name: &str) -> Option<CookieRecord> {
        let names = self.domains.get_mut(domain)?;
        let removed = names.remove(name);
        if names.is_empty() {
            self.domains.remove(domain);
        }
        removed
    }

    /// Iterates over `(domain, records)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DomainCookies)> {
        self.domains.iter()
    }

    /// Iterates over `(domain, name, record)` triples.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, &CookieRecord)> {
        self.domains.iter().flat_map(|(domain, names)| {
            names
                .iter()
                .map(move |(name, record)| (domain.as_str(), name.as_str(), record))
        })
    }

    pub(crate) fn into_domains(self) -> BTreeMap<String, DomainCookies> {
        self.domains
    }

    pub(crate) fn from_domains(domains: BTreeMap<String, DomainCookies>) -> Self {
        Self { domains }
    }
}
