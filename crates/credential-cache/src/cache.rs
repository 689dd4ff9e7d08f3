//! High-level API for managing cached credentials.

use crate::{CacheError, CacheKeys, CacheResult, CacheStorage, MemoryCache};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Metadata describing the cached subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSessionMeta {
    /// Subject id from the identity provider
    pub subject_id: String,
    /// When the entry was cached (RFC3339)
    pub stored_at: String,
}

/// High-level API for storing and clearing credential metadata.
///
/// Wraps a [`CacheStorage`] backend; every method is best-effort and callers
/// are expected to log rather than propagate failures on the write paths.
pub struct CredentialCache {
    storage: Box<dyn CacheStorage>,
}

impl CredentialCache {
    /// Create a credential cache with the given storage backend.
    pub fn new(storage: Box<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Convenience constructor with the in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCache::new()))
    }

    /// Record the current subject, replacing any previous entry.
    ///
    /// When no access token is available the stale one (if any) is removed
    /// so the cache never pairs an old token with a new subject.
    pub fn set_auth(&self, access_token: Option<&str>, subject_id: &str) -> CacheResult<()> {
        self.storage.set(CacheKeys::SUBJECT_ID, subject_id)?;
        match access_token {
            Some(token) => self.storage.set(CacheKeys::ACCESS_TOKEN, token)?,
            None => {
                self.storage.delete(CacheKeys::ACCESS_TOKEN)?;
            }
        }

        let meta = CachedSessionMeta {
            subject_id: subject_id.to_string(),
            stored_at: Utc::now().to_rfc3339(),
        };
        let encoded =
            serde_json::to_string(&meta).map_err(|e| CacheError::Encoding(e.to_string()))?;
        self.storage.set(CacheKeys::SESSION_META, &encoded)
    }

    /// Remove every cached credential entry.
    pub fn clear_auth(&self) -> CacheResult<()> {
        self.storage.delete(CacheKeys::SUBJECT_ID)?;
        self.storage.delete(CacheKeys::ACCESS_TOKEN)?;
        self.storage.delete(CacheKeys::SESSION_META)?;
        Ok(())
    }

    /// Current subject id, if one is cached.
    pub fn subject_id(&self) -> CacheResult<Option<String>> {
        self.storage.get(CacheKeys::SUBJECT_ID)
    }

    /// Cached access token, if one is present.
    pub fn access_token(&self) -> CacheResult<Option<String>> {
        self.storage.get(CacheKeys::ACCESS_TOKEN)
    }

    /// Cached session metadata, if present.
    pub fn session_meta(&self) -> CacheResult<Option<CachedSessionMeta>> {
        match self.storage.get(CacheKeys::SESSION_META)? {
            Some(raw) => {
                let meta =
                    serde_json::from_str(&raw).map_err(|e| CacheError::Encoding(e.to_string()))?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }
}
