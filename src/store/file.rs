//! Local file backend.
//!
//! One file holds one jar, shared by every user id (single-user deployments).
//! Content is plain JSON, or an [`crate::codec::EncryptionEnvelope`] when a
//! secret is configured. Writes go to a sibling temp file that is renamed
//! over the target, so readers never observe a partial write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use tokio::fs;
use tracing::{debug, instrument};

use crate::codec::CookieCodec;
use crate::identity::UserId;
use crate::jar::{CookieJar, prune, utc_now};

use super::{BackendKind, CookieBackend, StoreError};

/// Stores the jar in a single file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    codec: CookieCodec,
}

impl FileBackend {
    /// Creates a backend writing to `path` with `codec`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, codec: CookieCodec) -> Self {
        Self {
            path: path.into(),
            codec,
        }
    }

    /// Location of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_atomically(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_sibling(&self.path);
        let result = async {
            fs::write(&temp_path, contents).await?;
            set_owner_only_permissions(&temp_path).await?;
            fs::rename(&temp_path, &self.path).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        result
    }
}

#[async_trait]
impl CookieBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn load(&self, user: &UserId) -> Result<CookieJar, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("cookie store file absent; starting empty");
                return Ok(CookieJar::new());
            }
            Err(error) => return Err(error.into()),
        };
        let jar = self.codec.decode(&raw)?;
        Ok(prune(jar, utc_now()))
    }

    #[instrument(level = "debug", skip(self, jar), fields(path = %self.path.display()))]
    async fn save(&self, jar: &CookieJar, user: &UserId) -> Result<(), StoreError> {
        let now = utc_now();
        let pruned = prune(jar.clone(), now);
        let encoded = self.codec.encode(&pruned, now)?;
        self.write_atomically(&encoded).await?;
        debug!(
            records = pruned.len(),
            domains = pruned.domain_count(),
            encrypted = self.codec.is_encrypted(),
            "saved cookie store file"
        );
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        let encoded = self.codec.encode(&CookieJar::new(), utc_now())?;
        self.write_atomically(&encoded).await
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let suffix: u64 = rand::thread_rng().r#gen();
    let file_name = path
        .file_name()
        .map_or_else(|| "cookies".into(), |name| name.to_string_lossy().into_owned());
    path.with_file_name(format!(".{file_name}.{suffix:016x}.tmp"))
}

#[cfg(unix)]
async fn set_owner_only_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_owner_only_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
