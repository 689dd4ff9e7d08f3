//! Best-effort credential metadata cache.
//!
//! This crate provides a small side-channel store for the current
//! authentication subject: the subject id, an optional access token, and a
//! timestamp recording when they were cached. It is not the authoritative
//! session source — the identity provider is. Consumers read it when they
//! need the current subject id without awaiting the full auth state.

mod cache;
mod file;
mod keys;
mod memory;
mod traits;

pub use cache::{CachedSessionMeta, CredentialCache};
pub use file::FileCache;
pub use keys::CacheKeys;
pub use memory::MemoryCache;
pub use traits::CacheStorage;

use thiserror::Error;

/// Error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend-specific storage error
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
