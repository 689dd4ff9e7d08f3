//! In-memory cache backend.

use crate::{CacheResult, CacheStorage};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-lifetime in-memory cache backend.
///
/// The default for clients that do not need credential metadata to survive
/// a restart.
#[derive(Default)]
pub struct MemoryCache {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCache {
    fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut data = self.data.lock().unwrap();
        Ok(data.remove(key).is_some())
    }
}
