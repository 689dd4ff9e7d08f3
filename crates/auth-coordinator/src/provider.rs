//! Identity-provider session contract.
//!
//! The provider is a black box to this crate: a notifier of session
//! presence/absence plus a token-exchange primitive. State transitions are
//! never committed from the operation that triggered them; they always flow
//! through the subscription.

use crate::AuthResult;
use async_trait::async_trait;

/// Identity attached to an active provider session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    /// Provider-assigned subject id.
    pub uid: String,
    /// Email as known to the provider, if any.
    pub email: Option<String>,
    /// Provider token for the best-effort credential cache, if available.
    pub id_token: Option<String>,
}

/// Session-presence notification from the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// An authenticated session exists for this subject.
    SignedIn(SessionIdentity),
    /// No authenticated session exists.
    SignedOut,
}

/// Callback invoked for every session change, in emission order.
pub type SessionCallback = Box<dyn Fn(SessionEvent) + Send + Sync>;

/// Guard for an active session subscription.
///
/// The underlying unsubscribe runs exactly once, either via
/// [`cancel`](Self::cancel) or at drop.
pub struct SessionSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl SessionSubscription {
    /// Wrap an unsubscribe closure.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Cancel the subscription now instead of at drop.
    pub fn cancel(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Black-box identity provider collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a session-change callback.
    ///
    /// Implementations must synchronously deliver the current session state
    /// as the first event (initial resolution) and then every change, in
    /// order.
    fn subscribe(&self, on_change: SessionCallback) -> SessionSubscription;

    /// Exchange a backend-issued custom token for a provider session.
    ///
    /// Resolves when the session is established; the resulting presence
    /// event arrives through the subscription.
    async fn exchange_token(&self, custom_token: &str) -> AuthResult<()>;

    /// Terminate the provider session, triggering an absence event.
    async fn sign_out(&self) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_runs_unsubscribe_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = SessionSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_runs_unsubscribe_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        {
            let _subscription = SessionSubscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
