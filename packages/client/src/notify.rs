//! Transient user-facing notifications.
//!
//! Mutation outcomes are reported here rather than returned to the view as
//! failures to handle. A front-end drains the queue and shows each entry for
//! its `duration`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use store::config::NotificationConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub duration: Duration,
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    entries: VecDeque<Notification>,
}

/// Shared notification queue. Clones push into the same queue.
#[derive(Clone, Debug)]
pub struct Notifier {
    queue: Arc<Mutex<Queue>>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            queue: Arc::default(),
            duration,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(Duration::from_millis(config.duration_ms))
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, level: NotificationLevel, message: &str) -> u64 {
        match level {
            NotificationLevel::Error => tracing::warn!("notify: {message}"),
            _ => tracing::debug!("notify: {message}"),
        }
        let mut queue = self.lock();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.entries.push_back(Notification {
            id,
            level,
            message: message.to_string(),
            duration: self.duration,
        });
        id
    }

    pub fn info(&self, message: &str) -> u64 {
        self.push(NotificationLevel::Info, message)
    }

    pub fn success(&self, message: &str) -> u64 {
        self.push(NotificationLevel::Success, message)
    }

    pub fn error(&self, message: &str) -> u64 {
        self.push(NotificationLevel::Error, message)
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.lock().entries.drain(..).collect()
    }

    /// Queued notifications without removing them.
    pub fn pending(&self) -> Vec<Notification> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn dismiss(&self, id: u64) {
        self.lock().entries.retain(|n| n.id != id);
    }
}
