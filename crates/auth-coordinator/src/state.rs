//! Authentication state model.
//!
//! [`AuthState`] is the single object observers consume. It is only ever
//! built through the constructors and derivation methods below, so
//! `is_authenticated == user.is_some()` holds in every committed state and
//! no observer can see a half-updated structure.

use crate::backend::ProfileFields;
use crate::provider::SessionIdentity;
use serde::{Deserialize, Serialize};

/// Unified user record: provider identity plus backend profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Subject id assigned by the identity provider, immutable per session.
    pub uid: String,
    /// Email address, backend-authoritative with provider fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name from the backend profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Remaining backend profile fields, merged all-or-nothing per fetch.
    #[serde(default, flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    /// Merge the provider identity with a freshly fetched backend profile.
    ///
    /// The backend is authoritative for every non-uid field; the provider
    /// email is kept only when the profile does not carry one. The merge is
    /// a single construction, never a field-by-field patch of an existing
    /// record.
    pub fn merge(identity: &SessionIdentity, profile: ProfileFields) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: profile.email.or_else(|| identity.email.clone()),
            display_name: profile.display_name,
            profile: profile.extra,
        }
    }
}

/// Snapshot of authentication state seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthState {
    /// Present iff the session is active and the profile fetch succeeded.
    pub user: Option<UserRecord>,
    /// Always equal to `user.is_some()`.
    pub is_authenticated: bool,
    /// True during initial session resolution and in-flight login/signup.
    pub is_loading: bool,
    /// Last operation failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthState {
    /// Initial state: session resolution pending, nothing known yet.
    pub fn resolving() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    /// Session active and profile merged.
    pub fn authenticated(user: UserRecord) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    /// No active session.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: false,
            error: None,
        }
    }

    /// Same session fields with a new operation in flight.
    pub fn operation_started(&self) -> Self {
        Self {
            is_loading: true,
            error: None,
            ..self.clone()
        }
    }

    /// Same session fields with a failure recorded.
    pub fn operation_failed(&self, message: impl Into<String>) -> Self {
        Self {
            is_loading: false,
            error: Some(message.into()),
            ..self.clone()
        }
    }

    /// Same state with the error cleared.
    pub fn error_cleared(&self) -> Self {
        Self {
            error: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(uid: &str) -> SessionIdentity {
        SessionIdentity {
            uid: uid.to_string(),
            email: Some("provider@example.com".to_string()),
            id_token: None,
        }
    }

    fn user(uid: &str) -> UserRecord {
        UserRecord::merge(&identity(uid), ProfileFields::default())
    }

    #[test]
    fn test_constructors_uphold_invariant() {
        assert!(!AuthState::resolving().is_authenticated);
        assert!(AuthState::resolving().user.is_none());

        let authenticated = AuthState::authenticated(user("u1"));
        assert!(authenticated.is_authenticated);
        assert!(authenticated.user.is_some());

        let signed_out = AuthState::signed_out();
        assert!(!signed_out.is_authenticated);
        assert!(signed_out.user.is_none());
    }

    #[test]
    fn test_operation_started_preserves_session_fields() {
        let state = AuthState::authenticated(user("u1")).operation_started();
        assert!(state.is_loading);
        assert!(state.error.is_none());
        assert!(state.is_authenticated);
        assert_eq!(state.user.as_ref().map(|u| u.uid.as_str()), Some("u1"));
    }

    #[test]
    fn test_operation_failed_records_message_only() {
        let state = AuthState::authenticated(user("u1")).operation_failed("boom");
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.is_authenticated);
    }

    #[test]
    fn test_error_cleared_is_idempotent() {
        let failed = AuthState::signed_out().operation_failed("boom");
        let cleared = failed.error_cleared();
        assert!(cleared.error.is_none());
        assert_eq!(cleared.error_cleared(), cleared);
    }

    #[test]
    fn test_merge_prefers_backend_email() {
        let profile = ProfileFields {
            email: Some("backend@example.com".to_string()),
            display_name: Some("Backend Name".to_string()),
            extra: serde_json::Map::new(),
        };
        let merged = UserRecord::merge(&identity("u1"), profile);
        assert_eq!(merged.email.as_deref(), Some("backend@example.com"));
        assert_eq!(merged.display_name.as_deref(), Some("Backend Name"));
    }

    #[test]
    fn test_merge_falls_back_to_provider_email() {
        let merged = UserRecord::merge(&identity("u1"), ProfileFields::default());
        assert_eq!(merged.email.as_deref(), Some("provider@example.com"));
        assert_eq!(merged.uid, "u1");
    }

    #[test]
    fn test_merge_carries_extra_profile_fields() {
        let mut extra = serde_json::Map::new();
        extra.insert("plan".to_string(), serde_json::json!("pro"));
        let profile = ProfileFields {
            email: None,
            display_name: None,
            extra,
        };
        let merged = UserRecord::merge(&identity("u1"), profile);
        assert_eq!(merged.profile.get("plan"), Some(&serde_json::json!("pro")));
    }
}
