//! Storage trait definitions.

use crate::CacheResult;

/// Trait for credential cache backends
pub trait CacheStorage: Send + Sync {
    /// Store a value
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Retrieve a value
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Delete a value, returning whether it existed
    fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Check if a key exists
    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
