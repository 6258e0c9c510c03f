//! # Filesystem-backed key/value store
//!
//! [`FileStore`] is a [`KeyValueStore`] implementation that keeps each entry in
//! its own file. It is used by native front-ends so a session survives process
//! restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── token      # opaque credential token
//! └── user       # JSON identity
//! ```
//!
//! Use [`FileStore::default_dir`] for the platform data directory:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/blog-client/` |
//! | Linux | `~/.local/share/blog-client/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\blog-client\` |

use std::path::{Path, PathBuf};

use crate::session::KeyValueStore;

const APP_DIR: &str = "blog-client";

/// Filesystem-backed KeyValueStore for native persistence.
#[derive(Clone, Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// `<data_dir>/blog-client`, or `./blog-client` when the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers; strip separators so a key can never escape base.
        let name: String = key
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.base.join(name)
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.entry_path(key)).ok()
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        if let Err(e) = std::fs::create_dir_all(&self.base) {
            tracing::error!("Failed to create {}: {}", self.base.display(), e);
            return false;
        }
        match std::fs::write(self.entry_path(key), value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write {key}: {e}");
                false
            }
        }
    }

    async fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.entry_path(key));
    }
}
