//! # Client configuration: `blog.toml`
//!
//! Defines the TOML configuration file read by front-ends at start-up
//! (filename: [`ClientConfig::filename`] = `"blog.toml"`).
//!
//! ## Structure
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:5000/api"
//! timeout_secs = 30          # 0 disables the request timeout
//!
//! [notifications]
//! duration_ms = 2000
//!
//! [feed]
//! posts_per_page = 6
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config with builder helpers and TOML (de)serialisation. |
//! | [`ApiConfig`] | Remote API base URL and request timeout. |
//! | [`NotificationConfig`] | How long a transient notification stays visible. |
//! | [`FeedConfig`] | Page size for the post feed. |
//!
//! Every section derives `Default` so a missing or empty file is equivalent to
//! the default configuration.

use serde::{Deserialize, Serialize};

/// Environment variable that overrides [`ApiConfig::base_url`].
pub const API_URL_ENV: &str = "BLOG_API_URL";

/// Top-level configuration stored in `blog.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_duration")]
    pub duration_ms: u64,
}

fn default_duration() -> u64 {
    2000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
}

fn default_posts_per_page() -> usize {
    6
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
        }
    }
}

impl ClientConfig {
    /// Builder method to set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Apply the [`API_URL_ENV`] override when it is set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => self.with_base_url(url.trim()),
            _ => self,
        }
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "blog.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
