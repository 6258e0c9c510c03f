//! # Session store
//!
//! [`SessionStore`] is the single source of truth for "who is the current user".
//! It owns the in-memory [`SessionState`] and the durable copy behind a
//! [`SessionPersistence`] backend, and it is the only writer of either.
//!
//! ## States
//!
//! ```text
//! Uninitialized ──initialize──▶ Authenticated | Unauthenticated
//! Unauthenticated ──login──▶ Authenticated
//! Authenticated ──logout──▶ Unauthenticated
//! ```
//!
//! There is no way back to `Uninitialized`. An authenticated session always holds
//! both the identity and the token; the type makes a half session
//! unrepresentable.
//!
//! ## Observing
//!
//! State lives in a `tokio::sync::watch` channel. [`SessionStore::handle`] gives
//! consumers a cheap read-only [`SessionHandle`]; [`SessionStore::subscribe`]
//! gives observers (such as [`crate::LoginRedirect`]) change notifications.

use store::{Identity, SessionPersistence};
use tokio::sync::watch;

use crate::error::ClientError;

/// An authenticated identity paired with its credential token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    identity: Identity,
    token: String,
}

impl Session {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Opaque credential, only ever forwarded as a bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(session) => Some(&session.identity),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated(session) => Some(&session.token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// `initialize` has run.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

pub struct SessionStore<P: SessionPersistence> {
    persistence: P,
    state: watch::Sender<SessionState>,
}

impl<P: SessionPersistence> SessionStore<P> {
    pub fn new(persistence: P) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self { persistence, state }
    }

    /// Resolve the initial state from durable storage. No network call is made.
    ///
    /// A missing token, a missing identity or an identity that does not parse
    /// all resolve to `Unauthenticated` and erase both persisted entries.
    /// Calling this again after the state has resolved returns the current state
    /// unchanged.
    pub async fn initialize(&self) -> SessionState {
        if self.state.borrow().is_resolved() {
            tracing::debug!("Session already initialized");
            return self.snapshot();
        }

        let loaded = self.persistence.load().await.into_session();

        // login() may have resolved the state while storage was being read.
        if self.state.borrow().is_resolved() {
            return self.snapshot();
        }

        let next = match loaded {
            Some((identity, token)) => {
                tracing::info!("Restored session for {}", identity.username);
                SessionState::Authenticated(Session { identity, token })
            }
            None => {
                tracing::info!("No valid persisted session");
                self.persistence.clear().await;
                SessionState::Unauthenticated
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Replace the session wholesale and persist it.
    ///
    /// The caller has already validated the credentials remotely; this never
    /// talks to the API.
    pub async fn login(&self, identity: Identity, token: String) {
        self.persistence.save(&identity, &token).await;
        tracing::info!("Logged in as {}", identity.username);
        self.state
            .send_replace(SessionState::Authenticated(Session { identity, token }));
    }

    /// Clear the session and both persisted entries. Idempotent.
    pub async fn logout(&self) {
        self.persistence.clear().await;
        if self.state.borrow().is_authenticated() {
            tracing::info!("Logged out");
        }
        self.state.send_replace(SessionState::Unauthenticated);
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Identity of the caller, or `NotAuthenticated` for gated actions.
    pub fn require_identity(&self) -> Result<Identity, ClientError> {
        self.current_identity().ok_or(ClientError::NotAuthenticated)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            state: self.state.subscribe(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

/// Read-only view of the session for the mutation paths.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn require_identity(&self) -> Result<Identity, ClientError> {
        self.current_identity().ok_or(ClientError::NotAuthenticated)
    }
}
