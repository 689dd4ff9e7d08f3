//! Authentication error types.

use thiserror::Error;

/// Error type for coordinator and collaborator operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Backend login/signup/logout request failed. The message is surfaced
    /// verbatim in the auth state's `error` field.
    #[error("{0}")]
    Backend(String),

    /// Backend profile retrieval failed. Never revokes session state.
    #[error("Failed to load profile")]
    ProfileFetch(String),

    /// Token exchange or sign-out failed at the identity provider.
    #[error("Session error: {0}")]
    Session(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Credential cache error
    #[error("Credential cache error: {0}")]
    Cache(#[from] credential_cache::CacheError),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be
    /// retried by the caller (retry policy lives outside this crate).
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }

    /// Detail string for the profile-fetch failure, used in logs; the
    /// `Display` form stays the stable user-facing message.
    pub fn profile_fetch_detail(&self) -> Option<&str> {
        match self {
            AuthError::ProfileFetch(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_raw_message() {
        let error = AuthError::Backend("invalid credentials".to_string());
        assert_eq!(error.to_string(), "invalid credentials");
    }

    #[test]
    fn test_profile_fetch_error_displays_stable_message() {
        let error = AuthError::ProfileFetch("connection reset".to_string());
        assert_eq!(error.to_string(), "Failed to load profile");
        assert_eq!(error.profile_fetch_detail(), Some("connection reset"));
    }

    #[test]
    fn test_session_error_display() {
        let error = AuthError::Session("exchange rejected".to_string());
        assert_eq!(error.to_string(), "Session error: exchange rejected");
    }

    #[test]
    fn test_is_not_transient_backend_error() {
        assert!(!AuthError::Backend("bad password".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient_session_error() {
        assert!(!AuthError::Session("rejected".to_string()).is_transient());
    }
}
