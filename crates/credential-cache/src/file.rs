//! File-backed cache backend.
//!
//! Stores the whole cache as one JSON document. A missing or corrupt file is
//! treated as an empty cache; this store is best-effort by contract.

use crate::{CacheError, CacheResult, CacheStorage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Cache backend persisted as a JSON file on disk.
pub struct FileCache {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileCache {
    /// Open (or create) a file-backed cache at the given path.
    pub fn open(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(error) => {
                    warn!(path = %path.display(), %error, "corrupt credential cache file, starting empty");
                    HashMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn persist(&self, data: &HashMap<String, String>) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents =
            serde_json::to_string_pretty(data).map_err(|e| CacheError::Encoding(e.to_string()))?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl CacheStorage for FileCache {
    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.persist(&data)
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut data = self.data.lock().unwrap();
        let existed = data.remove(key).is_some();
        if existed {
            self.persist(&data)?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("cache.json")).unwrap();
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = FileCache::open(&path).unwrap();
        cache.set("key", "value").unwrap();
        drop(cache);

        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(reopened.get("key").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json at all {").unwrap();

        let cache = FileCache::open(&path).unwrap();
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[test]
    fn test_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = FileCache::open(&path).unwrap();
        cache.set("key", "value").unwrap();
        assert!(cache.delete("key").unwrap());
        drop(cache);

        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(reopened.get("key").unwrap(), None);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = FileCache::open(&path).unwrap();
        cache.set("key", "value").unwrap();
        assert!(path.exists());
    }
}
