//! Durable per-user state: a JSON snapshot file behind one serialized
//! update path.
//!
//! Both scan cycles, the Telegram command handlers, and the dashboard
//! API mutate state exclusively through [`StateStore::update`], so
//! interleaved cycles can never lose each other's writes. A failed save
//! is logged and the in-memory snapshot stays authoritative; only
//! durability, not correctness, degrades until the next save succeeds.

use giftwatch_core::{UserConfig, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Full snapshot of all per-user state.
///
/// `BTreeMap` keeps user iteration in a stable, deterministic order, so
/// notification-budget exhaustion within a cycle is reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: BTreeMap<UserId, UserConfig>,
}

impl Snapshot {
    /// Get or create the config for a user (first interaction).
    pub fn ensure_user(&mut self, user: UserId) -> &mut UserConfig {
        self.users.entry(user).or_default()
    }
}

/// Owner of the durable snapshot.
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
    inner: Arc<Mutex<Snapshot>>,
}

impl StateStore {
    /// Load the snapshot from `path`. A missing file yields an empty
    /// snapshot; a present but unreadable file is an error, since
    /// silently starting empty would drop every user's configuration.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no state file yet, starting empty");
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(snapshot)),
        })
    }

    /// Run a read-only closure against the current snapshot.
    pub async fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    /// Run a mutating closure against the snapshot, then persist.
    ///
    /// This is the single serialized update path: the mutex is held
    /// across mutation and save, so two cycles appending to the same
    /// user's log can never interleave destructively.
    pub async fn update<T>(&self, f: impl FnOnce(&mut Snapshot) -> T) -> T {
        let mut guard = self.inner.lock().await;
        let out = f(&mut guard);
        if let Err(e) = persist(&self.path, &guard).await {
            warn!(error = %e, path = %self.path.display(), "state save failed, keeping in-memory state");
        }
        out
    }

    /// Persist the current snapshot, surfacing any error (shutdown path).
    pub async fn save_now(&self) -> Result<(), StoreError> {
        let guard = self.inner.lock().await;
        persist(&self.path, &guard).await
    }
}

/// Atomic write: temp file in the same directory, then rename.
async fn persist(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftwatch_core::{GiftFilter, LogEntry, LogKind, Subscription, Ton};
    use pretty_assertions::assert_eq;

    fn state_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("state.json")
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(state_path(&dir)).await.unwrap();
        let count = store.read(|s| s.users.len()).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);

        let store = StateStore::load(&path).await.unwrap();
        store
            .update(|s| {
                let cfg = s.ensure_user(UserId(42));
                cfg.enabled = true;
                cfg.max_price = Some(Ton::from_f64(10.0));
                cfg.subscriptions
                    .push(Subscription::new("s1", GiftFilter::new("Plush Pepe"), None));
                cfg.push_log(LogEntry::new(1, LogKind::Notify, "hello"), 50);
            })
            .await;

        let reloaded = StateStore::load(&path).await.unwrap();
        let cfg = reloaded
            .read(|s| s.users.get(&UserId(42)).cloned())
            .await
            .unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_price, Some(Ton::from_f64(10.0)));
        assert_eq!(cfg.subscriptions.len(), 1);
        assert_eq!(cfg.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = state_path(&dir);
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = StateStore::load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(state_path(&dir)).await.unwrap();
        store
            .update(|s| {
                s.ensure_user(UserId(7)).enabled = true;
                // Second call must not reset the config
                assert!(s.ensure_user(UserId(7)).enabled);
            })
            .await;
        let count = store.read(|s| s.users.len()).await;
        assert_eq!(count, 1);
    }
}
