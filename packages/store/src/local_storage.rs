//! # Browser localStorage store
//!
//! [`LocalStorageStore`] is the [`KeyValueStore`] used on the **web platform**.
//! It reads and writes `window.localStorage` through `web-sys`.
//!
//! Entries are stored under their plain key (`"token"`, `"user"`) unless a
//! namespace is given, in which case the key becomes `"<namespace>:<key>"`.
//!
//! ## Error handling
//!
//! Errors (storage disabled, quota exceeded, private browsing) are swallowed. A
//! store that cannot be reached reads as empty, which the session store treats
//! as "logged out", and rejects every write.

use web_sys::Storage;

use crate::session::KeyValueStore;

/// localStorage-backed KeyValueStore for the web platform.
#[derive(Clone, Debug, Default)]
pub struct LocalStorageStore {
    namespace: Option<String>,
}

impl LocalStorageStore {
    /// Unscoped store using plain keys.
    pub fn new() -> Self {
        Self::with_namespace(None)
    }

    /// Store whose keys are prefixed with `"<namespace>:"`.
    pub fn with_namespace(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
        }
    }

    fn storage(&self) -> Option<Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    fn scoped_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{key}"),
            None => key.to_string(),
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(&self.scoped_key(key)).ok()?
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        let Some(storage) = self.storage() else {
            return false;
        };
        let stored = storage.set_item(&self.scoped_key(key), value).is_ok();
        if !stored {
            tracing::warn!("localStorage rejected write of {key}");
        }
        stored
    }

    async fn remove(&self, key: &str) {
        let Some(storage) = self.storage() else {
            return;
        };
        let _ = storage.remove_item(&self.scoped_key(key));
    }
}
