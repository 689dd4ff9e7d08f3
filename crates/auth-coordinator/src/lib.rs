//! Client authentication coordinator.
//!
//! This crate synchronizes the identity provider's session state, the
//! backend-issued user profile, and locally cached credential metadata into
//! a single observable [`AuthState`]:
//! - Session-presence events are queued and reconciled one at a time, in
//!   emission order.
//! - Every event carries a generation; a profile fetch whose subject has
//!   been superseded is discarded at commit time instead of overwriting
//!   newer state.
//! - Login, signup, logout, and clear-error drive the collaborators while
//!   the session subscription remains the single path that commits state
//!   transitions.

mod backend;
mod coordinator;
mod error;
mod provider;
mod state;

pub use backend::{BackendApi, CredentialGrant, HttpBackendClient, ProfileFields};
pub use coordinator::{AuthCoordinator, StateCallback};
pub use error::{AuthError, AuthResult};
pub use provider::{
    IdentityProvider, SessionCallback, SessionEvent, SessionIdentity, SessionSubscription,
};
pub use state::{AuthState, UserRecord};
