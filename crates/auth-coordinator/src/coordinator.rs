//! The authentication coordinator.
//!
//! Wires the identity provider, the backend API, and the credential cache
//! together behind one observable [`AuthState`]. Session events are queued
//! on a channel and reconciled one at a time by a spawned task, so no
//! reconciliation races another's commit. Every queued event carries a
//! generation taken at enqueue time; a profile fetch whose generation is no
//! longer current is discarded instead of overwriting newer state.

use crate::backend::BackendApi;
use crate::provider::{IdentityProvider, SessionEvent, SessionIdentity, SessionSubscription};
use crate::state::{AuthState, UserRecord};
use crate::AuthResult;
use credential_cache::CredentialCache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Error message committed to state when a profile fetch fails.
const PROFILE_LOAD_ERROR: &str = "Failed to load profile";

/// Callback type for auth state change notifications.
pub type StateCallback = Box<dyn Fn(&AuthState) + Send + Sync>;

/// Session event plus the generation it was assigned at enqueue time.
struct QueuedEvent {
    generation: u64,
    event: SessionEvent,
}

/// State cell shared between the coordinator and the reconciler task.
struct Shared {
    state: Mutex<AuthState>,
    observers: Mutex<Vec<StateCallback>>,
    generation: AtomicU64,
}

impl Shared {
    fn snapshot(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    /// Atomically replace the state, notifying observers only on change.
    fn commit(&self, next: AuthState) {
        self.commit_with(move |_| next);
    }

    /// Derive the next state from the current one and commit it under the
    /// state lock, so no commit from another task lands between the read and
    /// the write. The observer list is locked before the state lock is
    /// released, which keeps notification order equal to commit order;
    /// callbacks themselves run without the state lock held.
    fn commit_with<F>(&self, derive: F)
    where
        F: FnOnce(&AuthState) -> AuthState,
    {
        let mut state = self.state.lock().unwrap();
        let next = derive(&state);
        if *state == next {
            return;
        }
        debug!(
            is_authenticated = next.is_authenticated,
            is_loading = next.is_loading,
            has_error = next.error.is_some(),
            "auth state transition"
        );
        *state = next.clone();

        let observers = self.observers.lock().unwrap();
        drop(state);
        for observer in observers.iter() {
            observer(&next);
        }
    }
}

/// Coordinates session-change notifications, credential exchange, and
/// profile retrieval into a single authentication state.
///
/// The four operations (`login`, `signup`, `logout`, `clear_error`) drive
/// the collaborators; the session subscription is the single path that
/// commits session transitions.
pub struct AuthCoordinator {
    provider: Arc<dyn IdentityProvider>,
    backend: Arc<dyn BackendApi>,
    cache: Arc<CredentialCache>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<SessionSubscription>>,
}

impl AuthCoordinator {
    /// Create a coordinator. Call [`start`](Self::start) to subscribe to
    /// the provider and begin reconciling.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        backend: Arc<dyn BackendApi>,
        cache: Arc<CredentialCache>,
    ) -> Self {
        Self {
            provider,
            backend,
            cache,
            shared: Arc::new(Shared {
                state: Mutex::new(AuthState::resolving()),
                observers: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe to session changes and spawn the reconciler task.
    ///
    /// Must be called from within a tokio runtime. Panics if the
    /// coordinator was already started.
    pub fn start(&self) {
        let mut slot = self.subscription.lock().unwrap();
        if slot.is_some() {
            // Release the guard first so the panic does not poison the lock
            // for dispose() during unwinding.
            drop(slot);
            panic!("AuthCoordinator already started");
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = self.shared.clone();
        let subscription = self.provider.subscribe(Box::new(move |event| {
            // The live generation moves before the event is queued, so an
            // in-flight fetch for an older event sees itself as stale at
            // commit time.
            let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if sender.send(QueuedEvent { generation, event }).is_err() {
                warn!("session event dropped after coordinator disposal");
            }
        }));
        *slot = Some(subscription);

        tokio::spawn(reconcile_loop(
            receiver,
            self.shared.clone(),
            self.backend.clone(),
            self.cache.clone(),
        ));
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.shared.snapshot()
    }

    /// Register an observer for committed state changes.
    pub fn on_state_change(&self, callback: StateCallback) {
        self.shared.observers.lock().unwrap().push(callback);
    }

    /// Authenticate with email and password.
    ///
    /// On success the call resolves once the provider accepted the token
    /// exchange; the authenticated state itself is committed by the
    /// reconciler when the session event arrives. On failure the error is
    /// recorded in state and re-raised to the caller.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        self.shared.commit_with(|state| state.operation_started());
        let result = self.login_inner(email, password).await;
        self.finish_operation("login", result)
    }

    /// Create an account and authenticate, same shape as [`login`](Self::login).
    pub async fn signup(&self, email: &str, password: &str) -> AuthResult<()> {
        self.shared.commit_with(|state| state.operation_started());
        let result = self.signup_inner(email, password).await;
        self.finish_operation("signup", result)
    }

    /// Sign out.
    ///
    /// Provider and backend failures are logged, never surfaced; the
    /// signed-out state is committed via the resulting absence event.
    /// Session termination is optimistic by design.
    pub async fn logout(&self) {
        if let Err(error) = self.provider.sign_out().await {
            warn!(%error, "provider sign-out failed");
        }
        if let Err(error) = self.backend.logout().await {
            warn!(%error, "backend logout failed");
        }
    }

    /// Clear the last operation error. Idempotent; observers are notified
    /// only when the state actually changed.
    pub fn clear_error(&self) {
        self.shared.commit_with(|state| state.error_cleared());
    }

    /// Cancel the session subscription. Safe to call more than once; the
    /// underlying unsubscribe runs exactly once. Runs from Drop, so it must
    /// tolerate a poisoned lock instead of panicking.
    pub fn dispose(&self) {
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(subscription) = slot.take() {
            subscription.cancel();
        }
    }

    async fn login_inner(&self, email: &str, password: &str) -> AuthResult<()> {
        let grant = self.backend.login(email, password).await?;
        self.provider.exchange_token(&grant.custom_token).await
    }

    async fn signup_inner(&self, email: &str, password: &str) -> AuthResult<()> {
        let grant = self.backend.signup(email, password).await?;
        self.provider.exchange_token(&grant.custom_token).await
    }

    fn finish_operation(&self, operation: &str, result: AuthResult<()>) -> AuthResult<()> {
        match &result {
            Ok(()) => {
                info!(operation, "credential operation accepted, awaiting session event");
            }
            Err(error) => {
                warn!(operation, %error, "credential operation failed");
                self.shared
                    .commit_with(|state| state.operation_failed(error.to_string()));
            }
        }
        result
    }
}

impl Drop for AuthCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn reconcile_loop(
    mut receiver: mpsc::UnboundedReceiver<QueuedEvent>,
    shared: Arc<Shared>,
    backend: Arc<dyn BackendApi>,
    cache: Arc<CredentialCache>,
) {
    while let Some(queued) = receiver.recv().await {
        match queued.event {
            SessionEvent::SignedIn(identity) => {
                reconcile_signed_in(&shared, backend.as_ref(), &cache, queued.generation, identity)
                    .await;
            }
            SessionEvent::SignedOut => {
                reconcile_signed_out(&shared, &cache);
            }
        }
    }
    debug!("session event stream closed, reconciler stopping");
}

fn is_stale(shared: &Shared, generation: u64) -> bool {
    shared.generation.load(Ordering::SeqCst) != generation
}

async fn reconcile_signed_in(
    shared: &Shared,
    backend: &dyn BackendApi,
    cache: &CredentialCache,
    generation: u64,
    identity: SessionIdentity,
) {
    debug!(uid = %identity.uid, "session present, fetching profile");

    // The side channel tracks the provider's live subject, so it is updated
    // before the fetch rather than only on success.
    if let Err(error) = cache.set_auth(identity.id_token.as_deref(), &identity.uid) {
        warn!(uid = %identity.uid, %error, "credential cache update failed");
    }

    let fetched = backend.get_profile(&identity.uid).await;

    if is_stale(shared, generation) {
        debug!(uid = %identity.uid, "discarding profile result for superseded session event");
        return;
    }

    match fetched {
        Ok(profile) => {
            let user = UserRecord::merge(&identity, profile);
            info!(uid = %user.uid, "session reconciled, user authenticated");
            shared.commit(AuthState::authenticated(user));
        }
        Err(error) => {
            // A profile failure does not log the user out: session validity
            // and profile availability are independent axes.
            warn!(uid = %identity.uid, %error, detail = ?error.profile_fetch_detail(), "profile fetch failed");
            shared.commit_with(|state| state.operation_failed(PROFILE_LOAD_ERROR));
        }
    }
}

// Absence events are never stale: there is no suspension point between
// dequeue and commit, and any later event reconciles after this one.
fn reconcile_signed_out(shared: &Shared, cache: &CredentialCache) {
    if let Err(error) = cache.clear_auth() {
        warn!(%error, "credential cache clear failed");
    }
    info!("session absent, state cleared");
    shared.commit(AuthState::signed_out());
}
