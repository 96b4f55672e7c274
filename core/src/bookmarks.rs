//! Bookmarked followers persisted as a JSON file.
//!
//! # Design
//! The file is the only source of truth: every operation re-reads it, and
//! every mutation rewrites the whole list. Mutations hold an async mutex for
//! the full read-modify-write so two concurrent adds cannot lose each other.
//! Clones of a `BookmarkStore` share that mutex; open the store once and
//! clone the handle.
//!
//! Writes land in a sibling temp file, are flushed to disk and then renamed
//! over the target, so a crash mid-write leaves the previous list intact.
//!
//! The file holds a bare JSON array of `{"login", "avatar_url"}` objects with
//! no version field.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, Weak};

use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ConfigError, PersistenceError};
use crate::types::Follower;

pub const BOOKMARKS_FILE_NAME: &str = "bookmarked_users.json";

/// Mutation applied by `BookmarkStore::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkAction {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct BookmarkStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl BookmarkStore {
    /// Store bookmarks in `dir/bookmarked_users.json`. The directory is
    /// created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(BOOKMARKS_FILE_NAME);
        let lock = path_lock(&path);
        Self { path, lock }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.document_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All bookmarks in insertion order. A missing file is an empty list.
    pub async fn list(&self) -> Result<Vec<Follower>, PersistenceError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn contains(&self, login: &str) -> Result<bool, PersistenceError> {
        Ok(self.list().await?.iter().any(|b| b.login() == login))
    }

    /// Append `follower`. Fails with `BookmarkExists`, leaving the file
    /// untouched, when its login is already stored.
    pub async fn add(&self, follower: &Follower) -> Result<(), PersistenceError> {
        self.update(follower, BookmarkAction::Add).await
    }

    /// Remove the entry with `follower`'s login. Removing an absent bookmark
    /// succeeds without changing anything.
    pub async fn remove(&self, follower: &Follower) -> Result<(), PersistenceError> {
        self.update(follower, BookmarkAction::Remove).await
    }

    pub async fn update(&self, follower: &Follower, action: BookmarkAction) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut bookmarks = self.read().await?;

        match action {
            BookmarkAction::Add => {
                if bookmarks.contains(follower) {
                    debug!(login = follower.login(), "bookmark already exists");
                    return Err(PersistenceError::BookmarkExists);
                }
                bookmarks.push(follower.clone());
            }
            BookmarkAction::Remove => {
                let before = bookmarks.len();
                bookmarks.retain(|b| b != follower);
                if bookmarks.len() == before {
                    debug!(login = follower.login(), "bookmark not present, nothing to remove");
                    return Ok(());
                }
            }
        }

        self.write(&bookmarks).await?;
        info!(login = follower.login(), ?action, total = bookmarks.len(), "bookmarks updated");
        Ok(())
    }

    async fn read(&self) -> Result<Vec<Follower>, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::Read(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::Decode(e.to_string()))
    }

    async fn write(&self, bookmarks: &[Follower]) -> Result<(), PersistenceError> {
        let data =
            serde_json::to_vec_pretty(bookmarks).map_err(|e| PersistenceError::Encode(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await.map_err(PersistenceError::Write)?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist(&dir, &path, &data))
            .await
            .map_err(|e| PersistenceError::Write(std::io::Error::other(e)))?
            .map_err(PersistenceError::Write)
    }
}

/// The process-wide lock for `path`. Stores opened on the same path share
/// one lock for as long as any of them is alive.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>> = OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.retain(|_, lock| lock.strong_count() > 0);
    if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
        return lock;
    }
    let lock = Arc::new(Mutex::new(()));
    locks.insert(key, Arc::downgrade(&lock));
    lock
}

/// Write `data` to a fresh temp file in `dir`, sync it and rename it over
/// `path`. The temp file is removed if any step fails.
fn persist(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
