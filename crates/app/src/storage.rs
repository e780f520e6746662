//! Local Store
//!
//! Durable key/value mirror of client state: the logged-in user, the open
//! till, cached catalog lists and pending stock adjustments. Everything lives
//! in one JSON object at `<data_dir>/store.json`, rewritten atomically on every
//! change.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

/// Well-known store keys.
pub mod keys {
    /// Logged-in user.
    pub const CURRENT_USER: &str = "currentUser";

    /// Open till session.
    pub const CURRENT_SESSION: &str = "currentSession";

    /// Cached category list.
    pub const PREFETCH_CATEGORIES: &str = "prefetch_categories";

    /// Cached brand list.
    pub const PREFETCH_BRANDS: &str = "prefetch_brands";

    /// Cached product list.
    pub const PREFETCH_PRODUCTS: &str = "prefetch_products";

    /// Stock adjustments not yet accepted by the backend.
    pub const PENDING_STOCK_ADJUSTMENTS: &str = "pending_stock_adjustments";
}

const STORE_FILE: &str = "store.json";

/// Errors raised by the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("store i/o error at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,

        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A value could not be encoded or decoded.
    #[error("store value for {key} is invalid: {source}")]
    Serde {
        /// Key involved.
        key: String,

        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A previous writer panicked while holding the lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Shared handle to the JSON store. Clones share the same state.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    entries: Arc<Mutex<Map<String, Value>>>,
}

impl LocalStore {
    /// Open (or create) the store in `dir`.
    ///
    /// A missing file starts an empty store. A file that is not a JSON
    /// object is an error rather than silently discarded.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the directory cannot be created or the file
    /// cannot be read or parsed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(STORE_FILE);

        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Serde {
                key: STORE_FILE.to_string(),
                source,
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Ok(Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the stored value does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let entries = self.lock()?;

        entries
            .get(key)
            .filter(|value| !value.is_null())
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| serde_error(key, source))
            })
            .transpose()
    }

    /// Store `value` under `key` and flush to disk.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if encoding or writing fails.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| serde_error(key, source))?;

        let mut entries = self.lock()?;

        let mut next = entries.clone();
        next.insert(key.to_string(), value);

        self.commit(&mut entries, next)
    }

    /// Remove `key` and flush to disk. Removing a missing key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if writing fails.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;

        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);

        self.commit(&mut entries, next)
    }

    /// Read-modify-write the value under `key` while holding the lock, so
    /// concurrent updates never lose each other's changes. A missing key
    /// starts from `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if decoding, encoding or writing fails.
    pub fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let mut entries = self.lock()?;

        let mut current: T = match entries.get(key) {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .map_err(|source| serde_error(key, source))?,
            _ => T::default(),
        };

        let result = f(&mut current);

        let value =
            serde_json::to_value(&current).map_err(|source| serde_error(key, source))?;

        let mut next = entries.clone();
        next.insert(key.to_string(), value);

        self.commit(&mut entries, next)?;

        Ok(result)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Map<String, Value>>, StoreError> {
        self.entries.lock().map_err(|_poisoned| StoreError::Poisoned)
    }

    /// Write `next` to disk, then make it the in-memory state. A failed write
    /// leaves both untouched.
    fn commit(
        &self,
        entries: &mut Map<String, Value>,
        next: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.flush(&next)?;

        *entries = next;

        Ok(())
    }

    fn flush(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|source| serde_error(STORE_FILE, source))?;

        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;

        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn serde_error(key: &str, source: serde_json::Error) -> StoreError {
    StoreError::Serde {
        key: key.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn values_survive_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;

        let store = LocalStore::open(dir.path())?;
        store.set(keys::PREFETCH_CATEGORIES, &["a", "b"])?;

        let reopened = LocalStore::open(dir.path())?;
        let categories: Option<Vec<String>> = reopened.get(keys::PREFETCH_CATEGORIES)?;

        assert_eq!(categories, Some(vec!["a".to_string(), "b".to_string()]));

        Ok(())
    }

    #[test]
    fn missing_and_removed_keys_read_as_none() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        assert_eq!(store.get::<String>(keys::CURRENT_USER)?, None);

        store.set(keys::CURRENT_USER, "ana")?;
        store.remove(keys::CURRENT_USER)?;

        assert_eq!(store.get::<String>(keys::CURRENT_USER)?, None);

        Ok(())
    }

    #[test]
    fn update_starts_from_default_and_persists() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        let len = store.update(keys::PENDING_STOCK_ADJUSTMENTS, |pending: &mut Vec<u32>| {
            pending.push(7);
            pending.len()
        })?;

        assert_eq!(len, 1);
        assert_eq!(
            LocalStore::open(dir.path())?.get::<Vec<u32>>(keys::PENDING_STOCK_ADJUSTMENTS)?,
            Some(vec![7])
        );

        Ok(())
    }

    #[test]
    fn corrupt_file_is_reported() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(STORE_FILE), "not json")?;

        let result = LocalStore::open(dir.path());

        assert!(matches!(result, Err(StoreError::Serde { .. })));

        Ok(())
    }

    #[test]
    fn failed_write_leaves_memory_untouched() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = LocalStore::open(dir.path())?;

        store.set(keys::CURRENT_USER, "u1")?;

        fs::remove_file(store.path())?;
        fs::create_dir(store.path())?;

        assert!(store.set(keys::CURRENT_USER, "u2").is_err());
        assert!(store.remove(keys::CURRENT_USER).is_err());
        assert_eq!(store.get::<String>(keys::CURRENT_USER)?, Some("u1".to_string()));

        Ok(())
    }
}
