//! Store facade: the single entry point over the active backend.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::codec::CookieCodec;
use crate::config::StoreConfig;
use crate::identity::UserId;
use crate::jar::{CookieJar, CookieRecord};

use super::{
    AppwriteBackend, BackendKind, CookieBackend, FileBackend, StoreError, SupabaseBackend,
    build_store_http_client,
};

/// Capability flags reported by `GET /api/cloud-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloudStatus {
    /// Appwrite is the active backend.
    pub appwrite: bool,
    /// Supabase is the active backend.
    pub supabase: bool,
}

/// Total `load`/`save`/`clear` surface over exactly one [`CookieBackend`].
///
/// Backend failures never reach callers: `load` falls back to an empty jar and
/// `save`/`clear` become no-ops, with the failure logged at `warn`.
///
/// Cloning is cheap and clones share the backend and the per-user write locks.
#[derive(Clone)]
pub struct CookieStore {
    backend: Arc<dyn CookieBackend>,
    /// Serializes read-modify-write cycles per user within this process.
    /// Arc values let a caller drop the shard guard before awaiting the mutex.
    user_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("backend", &self.backend.kind())
            .field("locked_users", &self.user_locks.len())
            .finish()
    }
}

impl CookieStore {
    /// Wraps an already-constructed backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CookieBackend>) -> Self {
        Self {
            backend,
            user_locks: Arc::new(DashMap::new()),
        }
    }

    /// Builds the backend selected by `config` (Appwrite, then Supabase, then file).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the encryption key cannot be derived or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let kind = config.backend_kind();
        let backend: Arc<dyn CookieBackend> = match kind {
            BackendKind::Appwrite => {
                let appwrite = config.appwrite.clone().ok_or_else(|| missing_settings(kind))?;
                let client = build_store_http_client(kind, config.timeouts)?;
                Arc::new(AppwriteBackend::new(client, appwrite))
            }
            BackendKind::Supabase => {
                let supabase = config.supabase.clone().ok_or_else(|| missing_settings(kind))?;
                let client = build_store_http_client(kind, config.timeouts)?;
                Arc::new(SupabaseBackend::new(client, supabase))
            }
            BackendKind::File => {
                let codec = CookieCodec::from_secret(config.store_key.as_deref())?;
                Arc::new(FileBackend::new(config.file_path.clone(), codec))
            }
        };

        if kind != BackendKind::File && config.store_key.is_some() {
            debug!(backend = %kind, "STORE_KEY only applies to the file backend; ignoring");
        }
        info!(backend = %kind, "cookie store initialised");
        Ok(Self::new(backend))
    }

    /// The active backend.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Which document store, if any, is active.
    #[must_use]
    pub fn status(&self) -> CloudStatus {
        let kind = self.backend_kind();
        CloudStatus {
            appwrite: kind == BackendKind::Appwrite,
            supabase: kind == BackendKind::Supabase,
        }
    }

    /// Loads `user`'s jar; any backend failure yields an empty jar.
    pub async fn load(&self, user: &UserId) -> CookieJar {
        match self.backend.load(user).await {
            Ok(jar) => jar,
            Err(error) => {
                warn!(
                    backend = %self.backend_kind(),
                    user = %user,
                    error = %error,
                    transient = error.is_transient(),
                    "cookie load failed; using empty jar"
                );
                CookieJar::new()
            }
        }
    }

    /// Replaces `user`'s jar; failures are logged and dropped.
    pub async fn save(&self, jar: &CookieJar, user: &UserId) {
        if let Err(error) = self.backend.save(jar, user).await {
            warn!(
                backend = %self.backend_kind(),
                user = %user,
                error = %error,
                transient = error.is_transient(),
                "cookie save failed; change not persisted"
            );
        }
    }

    /// Wipes `user`'s jar; failures are logged and dropped.
    pub async fn clear(&self, user: &UserId) {
        let _guard = self.lock_user(user).await;
        if let Err(error) = self.backend.clear(user).await {
            warn!(
                backend = %self.backend_kind(),
                user = %user,
                error = %error,
                "cookie clear failed"
            );
        }
    }

    /// Merges one record into `user`'s jar, overwriting any record with the
    /// same domain and name.
    pub async fn upsert_record(
        &self,
        user: &UserId,
        domain: &str,
        name: &str,
        record: CookieRecord,
    ) {
        let _guard = self.lock_user(user).await;
        let mut jar = self.load(user).await;
        jar.insert(domain, name, record);
        self.save(&jar, user).await;
    }

    /// Merges several records for one domain in a single load/save cycle.
    pub async fn upsert_records(
        &self,
        user: &UserId,
        domain: &str,
        records: impl IntoIterator<Item = (String, CookieRecord)> + Send,
    ) {
        let _guard = self.lock_user(user).await;
        let mut jar = self.load(user).await;
        for (name, record) in records {
            jar.insert(domain, name, record);
        }
        self.save(&jar, user).await;
    }

    /// Removes one record; the domain disappears with its last record.
    ///
    /// Removing a record that does not exist leaves storage untouched.
    pub async fn remove_record(&self, user: &UserId, domain: &str, name: &str) {
        let _guard = self.lock_user(user).await;
        let mut jar = self.load(user).await;
        if jar.remove(domain, name).is_none() {
            debug!(user = %user, domain, "cookie to remove was not present");
            return;
        }
        self.save(&jar, user).await;
    }

    async fn lock_user(&self, user: &UserId) -> UserLockGuard {
        let key = user.as_str().to_string();
        let lock = self
            .user_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        UserLockGuard {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.user_locks),
            key,
        }
    }
}

/// Holds one user's write lock and drops its map entry once nobody else
/// holds or waits for it, so the map only tracks users with writes in flight.
struct UserLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    key: String,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn missing_settings(backend: BackendKind) -> StoreError {
    StoreError::Client {
        backend,
        message: "backend selected without its settings".to_string(),
    }
}
