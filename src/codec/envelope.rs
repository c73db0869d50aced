//! Authenticated encryption envelope for the file backend.
//!
//! Layout: `{ "iv": hex(16), "authTag": hex(16), "ciphertext": hex }`, AES-256-GCM
//! with a 16-byte IV and the tag stored detached. The key is derived with
//! scrypt (N=2^14, r=8, p=1) from the configured secret and a fixed salt, so
//! files written by earlier deployments with the same secret stay readable.

use std::fmt;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::CodecError;

/// AES-256-GCM with a 128-bit IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

const KEY_DERIVATION_SALT: &[u8] = b"scramjet-salt";
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
pub(crate) const KEY_LEN: usize = 32;
pub(crate) const IV_LEN: usize = 16;
pub(crate) const TAG_LEN: usize = 16;

/// Symmetric key derived from the configured store secret.
#[derive(Clone)]
pub struct StoreKey([u8; KEY_LEN]);

impl StoreKey {
    /// Derives the 32-byte key for `secret`.
    ///
    /// The salt is a constant: deployments sharing a secret share the derived
    /// key, so the secret is the confidentiality boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::KeyDerivation`] if the scrypt parameters are rejected.
    pub fn derive(secret: &str) -> Result<Self, CodecError> {
        let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
            .map_err(|_| CodecError::KeyDerivation)?;
        let mut key = [0_u8; KEY_LEN];
        scrypt::scrypt(secret.as_bytes(), KEY_DERIVATION_SALT, &params, &mut key)
            .map_err(|_| CodecError::KeyDerivation)?;
        Ok(Self(key))
    }

    fn cipher(&self) -> Aes256Gcm16 {
        Aes256Gcm16::new(GenericArray::from_slice(&self.0))
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreKey([REDACTED])")
    }
}

/// Serialized envelope written to disk when a secret is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionEnvelope {
    /// Hex-encoded 16-byte IV.
    pub iv: String,
    /// Hex-encoded 16-byte GCM authentication tag.
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    /// Hex-encoded ciphertext. Older files name this field `data`.
    #[serde(alias = "data")]
    pub ciphertext: String,
}

impl EncryptionEnvelope {
    /// Encrypts `plaintext` under a fresh random IV.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncryptionFailed`] if the cipher rejects the input.
    pub fn seal(key: &StoreKey, plaintext: &[u8]) -> Result<Self, CodecError> {
        let mut iv = [0_u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut buffer = plaintext.to_vec();
        let tag = key
            .cipher()
            .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", buffer.as_mut_slice())
            .map_err(|_| CodecError::EncryptionFailed)?;

        Ok(Self {
            iv: hex::encode(iv),
            auth_tag: hex::encode(tag),
            ciphertext: hex::encode(buffer),
        })
    }

    /// Verifies the tag and decrypts.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidEnvelope`] for malformed fields and
    /// [`CodecError::DecryptionFailed`] for a wrong key or tampered data.
    pub fn open(&self, key: &StoreKey) -> Result<Vec<u8>, CodecError> {
        let iv = hex::decode(&self.iv).map_err(|_| CodecError::InvalidEnvelope)?;
        let tag = hex::decode(&self.auth_tag).map_err(|_| CodecError::InvalidEnvelope)?;
        let mut buffer = hex::decode(&self.ciphertext).map_err(|_| CodecError::InvalidEnvelope)?;
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(CodecError::InvalidEnvelope);
        }

        key.cipher()
            .decrypt_in_place_detached(
                GenericArray::from_slice(&iv),
                b"",
                buffer.as_mut_slice(),
                GenericArray::from_slice(&tag),
            )
            .map_err(|_| CodecError::DecryptionFailed)?;
        Ok(buffer)
    }
}
