use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::ProfileForm;

pub const IS_LOGGED_IN_KEY: &str = "isLoggedIn";
pub const USER_INFO_KEY: &str = "userInfo";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Durable string key-value store, kept apart from the users table.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;
    async fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// Keeps all entries in one JSON object file.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `load`, but an unparsable file starts over from an empty map so
    /// the next write replaces it. The flag is true when that happened.
    async fn load_for_write(&self) -> Result<(BTreeMap<String, String>, bool), SessionError> {
        match self.load().await {
            Ok(entries) => Ok((entries, false)),
            Err(SessionError::Json(e)) => {
                warn!(
                    error = %e,
                    path = %self.path.display(),
                    "session file unreadable; overwriting"
                );
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let (mut entries, reset) = self.load_for_write().await?;
        if entries.remove(key).is_some() || reset {
            self.write(&entries).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// What a previous run left in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    LoggedOut,
    LoggedIn(Option<ProfileForm>),
}

/// Typed access to the two session keys.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Only the exact string `"true"` counts as logged in. An unreadable
    /// snapshot is dropped with a warning; the flag still wins.
    pub async fn restore(&self) -> Result<Restored, SessionError> {
        let flag = self.store.get_item(IS_LOGGED_IN_KEY).await?;
        if flag.as_deref() != Some("true") {
            return Ok(Restored::LoggedOut);
        }

        let snapshot = match self.store.get_item(USER_INFO_KEY).await? {
            Some(raw) if !raw.is_empty() => match serde_json::from_str::<ProfileForm>(&raw) {
                Ok(form) => Some(form),
                Err(e) => {
                    warn!(error = %e, "cached profile snapshot unreadable; ignoring");
                    None
                }
            },
            _ => None,
        };
        debug!(has_snapshot = snapshot.is_some(), "session restored");
        Ok(Restored::LoggedIn(snapshot))
    }

    /// Snapshot first, flag last: a failed write never leaves the flag set.
    pub async fn persist_login(&self, form: &ProfileForm) -> Result<(), SessionError> {
        self.save_snapshot(form).await?;
        self.store.set_item(IS_LOGGED_IN_KEY, "true").await
    }

    pub async fn save_snapshot(&self, form: &ProfileForm) -> Result<(), SessionError> {
        let raw = serde_json::to_string(form)?;
        self.store.set_item(USER_INFO_KEY, &raw).await
    }

    /// Cached profile, if any. Unreadable data is an error here.
    pub async fn snapshot(&self) -> Result<Option<ProfileForm>, SessionError> {
        match self.store.get_item(USER_INFO_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store.remove_item(IS_LOGGED_IN_KEY).await?;
        self.store.remove_item(USER_INFO_KEY).await
    }
}
