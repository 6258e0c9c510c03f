//! Navigation decisions derived from session state.
//!
//! The session store never navigates. [`LoginRedirect`] watches the store and
//! emits [`Navigation::Login`] whenever the session resolves to
//! unauthenticated (after `initialize` finds nothing usable, or after
//! `logout`). [`protect`] is the guard for routes that need an identity.

use store::Identity;
use tokio::sync::watch;

use crate::session::SessionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Login,
}

/// Outcome of guarding a protected route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// The session has not been initialized yet; render nothing.
    Pending,
    Allowed(Identity),
    Redirect(Navigation),
}

pub fn protect(state: &SessionState) -> RouteAccess {
    match state {
        SessionState::Uninitialized => RouteAccess::Pending,
        SessionState::Unauthenticated => RouteAccess::Redirect(Navigation::Login),
        SessionState::Authenticated(session) => RouteAccess::Allowed(session.identity().clone()),
    }
}

/// Observer that turns "became unauthenticated" into a login redirect.
pub struct LoginRedirect {
    state: watch::Receiver<SessionState>,
}

impl LoginRedirect {
    /// Only changes published after this call are observed.
    pub fn new(state: watch::Receiver<SessionState>) -> Self {
        Self { state }
    }

    fn route(state: &SessionState) -> Option<Navigation> {
        match state {
            SessionState::Unauthenticated => Some(Navigation::Login),
            _ => None,
        }
    }

    /// Consume the latest unseen change without waiting.
    pub fn poll(&mut self) -> Option<Navigation> {
        match self.state.has_changed() {
            Ok(true) => Self::route(&self.state.borrow_and_update()),
            _ => None,
        }
    }

    /// Wait for the next change that calls for navigation.
    ///
    /// Returns `None` once the session store has been dropped.
    pub async fn next(&mut self) -> Option<Navigation> {
        loop {
            if self.state.changed().await.is_err() {
                return None;
            }
            if let Some(nav) = Self::route(&self.state.borrow_and_update()) {
                return Some(nav);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use store::session::{TOKEN_KEY, USER_KEY};
    use store::{KeyValueStore, MemoryStore};

    fn ada() -> Identity {
        Identity {
            id: "u1".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_redirect_after_empty_initialize() {
        let session = SessionStore::new(MemoryStore::new());
        let mut redirect = LoginRedirect::new(session.subscribe());
        assert_eq!(redirect.poll(), None);

        session.initialize().await;
        assert_eq!(redirect.poll(), Some(Navigation::Login));
        // Seen changes are not reported twice.
        assert_eq!(redirect.poll(), None);
    }

    #[tokio::test]
    async fn test_no_redirect_after_restored_session() {
        let storage = MemoryStore::new();
        storage.set(TOKEN_KEY, "tok").await;
        storage
            .set(USER_KEY, &serde_json::to_string(&ada()).unwrap())
            .await;

        let session = SessionStore::new(storage);
        let mut redirect = LoginRedirect::new(session.subscribe());
        session.initialize().await;
        assert_eq!(redirect.poll(), None);
    }

    #[tokio::test]
    async fn test_next_waits_for_logout() {
        let session = SessionStore::new(MemoryStore::new());
        let mut redirect = LoginRedirect::new(session.subscribe());

        session.login(ada(), "tok".to_string()).await;
        session.logout().await;
        assert_eq!(redirect.next().await, Some(Navigation::Login));
    }

    #[tokio::test]
    async fn test_next_ends_when_store_dropped() {
        let session = SessionStore::new(MemoryStore::new());
        let mut redirect = LoginRedirect::new(session.subscribe());
        drop(session);
        assert_eq!(redirect.next().await, None);
    }

    #[tokio::test]
    async fn test_protect() {
        let session = SessionStore::new(MemoryStore::new());
        assert_eq!(protect(&session.snapshot()), RouteAccess::Pending);

        session.initialize().await;
        assert_eq!(
            protect(&session.snapshot()),
            RouteAccess::Redirect(Navigation::Login)
        );

        session.login(ada(), "tok".to_string()).await;
        assert_eq!(protect(&session.snapshot()), RouteAccess::Allowed(ada()));
    }
}
