//! Key-value persistence for session fields.
//!
//! The client doesn't care WHERE a session lives (a browser's local
//! storage, a file in the user's config dir, nowhere at all). It only
//! needs three things from a store:
//!
//! - read a value by key
//! - write several values at once
//! - remove several values at once
//!
//! The [`SessionStore`] trait captures exactly that. Writes are batched so
//! a session's three fields land together: either the whole write succeeds
//! or the store reports an error.
//!
//! # Implementations
//!
//! | Store           | Survives restart | Use case                        |
//! |-----------------|------------------|---------------------------------|
//! | [`MemoryStore`] | no               | tests, short-lived tools        |
//! | [`FileStore`]   | yes              | CLIs, desktop apps              |
//! | [`NoopStore`]   | n/a              | environments without storage    |

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::SessionError;

/// A synchronous key-value store for session fields.
///
/// # Trait bounds
///
/// - `Send + Sync` → one store is shared by every clone of the client and
///   by the background refresh task.
/// - `'static` → the store lives as long as the client.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if it's absent or the
    /// store can't be read.
    fn load(&self, key: &str) -> Option<String>;

    /// Writes every `(key, value)` pair in one batch.
    fn store_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError>;

    /// Removes every key in one batch. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// NoopStore
// ---------------------------------------------------------------------------

/// A store that remembers nothing.
///
/// Every read is absent and every write is dropped. A client built on this
/// store is never authenticated; it's the stand-in for a host without any
/// storage at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl SessionStore for NoopStore {
    fn load(&self, _key: &str) -> Option<String> {
        None
    }

    fn store_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
        debug!(count = entries.len(), "noop store dropped write");
        Ok(())
    }

    fn remove_many(&self, _keys: &[&str]) -> Result<(), SessionError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `entries`.
    ///
    /// Handy for starting a client "already signed in".
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A poisoned lock only means another thread panicked mid-write; the
    /// map itself is still a valid map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn store_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), SessionError> {
        let mut map = self.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A store that keeps every key in one JSON object on disk.
///
/// Each write rewrites the whole file: the new contents go to a sibling
/// temp file that is then renamed over the original, so a crash mid-write
/// leaves either the old file or the new one, never half of each.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file. A missing file is an empty store; an unreadable
    /// or corrupt one is logged and treated the same way.
    fn read_all(&self) -> HashMap<String, String> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return HashMap::new();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "session file corrupt, ignoring");
            HashMap::new()
        })
    }

    fn write_all(&self, map: &HashMap<String, String>) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(map)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), keys = map.len(), "session file written");
        Ok(())
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut HashMap<String, String>),
    ) -> Result<(), SessionError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut map = self.read_all();
        apply(&mut map);
        self.write_all(&map)
    }
}

impl SessionStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn store_many(&self, entries: &[(&str, String)]) -> Result<(), SessionError> {
        self.modify(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), SessionError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
