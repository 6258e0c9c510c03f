//! # Durable session storage
//!
//! The client keeps exactly two durable entries: the opaque credential token and
//! the JSON-serialised [`Identity`]. They are written and cleared as a pair.
//!
//! ## [`KeyValueStore`] trait
//!
//! An async string key/value interface with `get`/`set`/`remove`. Implementations
//! live in sibling modules: [`crate::MemoryStore`] for tests,
//! `FileStore` on native platforms and `LocalStorageStore` in the browser.
//! Backends swallow their own I/O errors: an unreadable entry reads as absent
//! and a failed write makes `set` return `false`.
//!
//! ## [`SessionPersistence`] trait
//!
//! The `load`/`save`/`clear` interface the session store is written against.
//! Every [`KeyValueStore`] gets it for free through a blanket impl that uses the
//! [`TOKEN_KEY`] and [`USER_KEY`] entries.

use std::future::Future;

use crate::models::Identity;

/// Key of the persisted credential token.
pub const TOKEN_KEY: &str = "token";
/// Key of the persisted identity JSON.
pub const USER_KEY: &str = "user";

/// Async trait for string key/value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>>;
    /// Returns `false` when the value could not be stored.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = bool>;
    fn remove(&self, key: &str) -> impl Future<Output = ()>;
}

/// Raw persisted entries, before validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl PersistedSession {
    /// Parse the pair into a usable session.
    ///
    /// Returns `None` when either entry is missing or blank, or when the identity
    /// JSON does not describe a valid [`Identity`].
    pub fn into_session(self) -> Option<(Identity, String)> {
        let token = self.token.filter(|t| !t.trim().is_empty())?;
        let raw = self.user?;
        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) if identity.is_valid() => Some((identity, token)),
            Ok(_) => {
                tracing::warn!("Persisted identity has no id");
                None
            }
            Err(e) => {
                tracing::warn!("Persisted identity is corrupt: {}", e);
                None
            }
        }
    }
}

/// Load/save/clear interface for the authenticated session.
pub trait SessionPersistence {
    fn load(&self) -> impl Future<Output = PersistedSession>;
    fn save(&self, identity: &Identity, token: &str) -> impl Future<Output = ()>;
    fn clear(&self) -> impl Future<Output = ()>;
}

impl<S: KeyValueStore> SessionPersistence for S {
    async fn load(&self) -> PersistedSession {
        PersistedSession {
            token: self.get(TOKEN_KEY).await,
            user: self.get(USER_KEY).await,
        }
    }

    async fn save(&self, identity: &Identity, token: &str) {
        match serde_json::to_string(identity) {
            Ok(user) => {
                if !(self.set(TOKEN_KEY, token).await && self.set(USER_KEY, &user).await) {
                    tracing::error!("Failed to persist session, clearing it");
                    self.clear().await;
                }
            }
            Err(e) => {
                // Never leave a token without its identity.
                tracing::error!("Failed to serialise identity: {}", e);
                self.clear().await;
            }
        }
    }

    async fn clear(&self) {
        self.remove(TOKEN_KEY).await;
        self.remove(USER_KEY).await;
    }
}
