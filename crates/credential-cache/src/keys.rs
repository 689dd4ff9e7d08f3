//! Cache key constants.

/// Keys used by the credential cache
pub struct CacheKeys;

impl CacheKeys {
    /// Current subject id from the identity provider
    pub const SUBJECT_ID: &'static str = "auth_subject_id";

    /// Provider access token, when one was available at cache time
    pub const ACCESS_TOKEN: &'static str = "auth_access_token";

    /// Cached session metadata (JSON)
    pub const SESSION_META: &'static str = "auth_session_meta";
}
