//! Jar serialization with optional encryption at rest.
//!
//! Whether a payload must be decrypted is decided by configuration (a secret
//! is or is not set), never by sniffing the content:
//! - no secret: plain JSON, and any parse failure decodes to an empty jar
//! - secret: an [`EncryptionEnvelope`], and every failure is surfaced as an error

mod envelope;

pub use envelope::{EncryptionEnvelope, StoreKey};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::jar::{CookieJar, prune};

/// Errors raised while encoding or decoding a jar.
///
/// Messages never include plaintext cookie data.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("cookie payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Envelope fields are missing, not hex, or the wrong length.
    #[error("encrypted cookie envelope is malformed")]
    InvalidEnvelope,
    /// Key derivation rejected its parameters.
    #[error("failed to derive cookie store key")]
    KeyDerivation,
    /// Encryption failed.
    #[error("failed to encrypt cookie store")]
    EncryptionFailed,
    /// Authentication failed (wrong key or tampered payload).
    #[error("failed to decrypt cookie store (wrong key or tampered data)")]
    DecryptionFailed,
    /// Decrypted bytes are not UTF-8.
    #[error("decrypted cookie store is not valid UTF-8")]
    InvalidUtf8,
}

/// Encodes and decodes jars, encrypting when a key is configured.
#[derive(Debug, Clone, Default)]
pub struct CookieCodec {
    key: Option<StoreKey>,
}

impl CookieCodec {
    /// Codec that reads and writes plain JSON.
    #[must_use]
    pub fn plain() -> Self {
        Self { key: None }
    }

    /// Codec that encrypts under `key`.
    #[must_use]
    pub fn encrypted(key: StoreKey) -> Self {
        Self { key: Some(key) }
    }

    /// Builds a codec from an optional secret, deriving the key once.
    ///
    /// Blank secrets are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::KeyDerivation`] if key derivation fails.
    pub fn from_secret(secret: Option<&str>) -> Result<Self, CodecError> {
        match secret.map(str::trim).filter(|secret| !secret.is_empty()) {
            Some(secret) => Ok(Self::encrypted(StoreKey::derive(secret)?)),
            None => Ok(Self::plain()),
        }
    }

    /// Returns true when payloads are encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }

    /// Prunes `jar` at `now` and serializes it.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if serialization or encryption fails.
    pub fn encode(&self, jar: &CookieJar, now: DateTime<Utc>) -> Result<String, CodecError> {
        let pruned = prune(jar.clone(), now);
        let plaintext = serde_json::to_string(&pruned)?;
        match &self.key {
            None => Ok(plaintext),
            Some(key) => {
                let envelope = EncryptionEnvelope::seal(key, plaintext.as_bytes())?;
                Ok(serde_json::to_string(&envelope)?)
            }
        }
    }

    /// Deserializes a payload produced by [`CookieCodec::encode`].
    ///
    /// Without a key, malformed input yields an empty jar. With a key, any
    /// malformed envelope or authentication failure is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] only when a key is configured.
    pub fn decode(&self, raw: &str) -> Result<CookieJar, CodecError> {
        match &self.key {
            None => Ok(serde_json::from_str(raw).unwrap_or_else(|error| {
                warn!(error = %error, "Stored cookie payload is not valid JSON; using empty jar");
                CookieJar::new()
            })),
            Some(key) => {
                let envelope: EncryptionEnvelope = serde_json::from_str(raw)?;
                let plaintext = envelope.open(key)?;
                let text = String::from_utf8(plaintext).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(serde_json::from_str(&text)?)
            }
        }
    }
}
