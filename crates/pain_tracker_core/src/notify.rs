//! Notification collaborator.
//!
//! # Responsibility
//! - Define the fire-and-forget success/warning/error feedback channel.
//! - Provide a queue-backed sink hosts drain into toasts or stderr.
//!
//! # Invariants
//! - Notifiers return nothing the core depends on; a failing sink never
//!   changes entry or record state.
//! - Core-generated messages never carry note, location or symptom text.

use std::sync::{Mutex, MutexGuard};

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

/// Feedback sink invoked after validation and persistence outcomes.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, title: &str, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Success,
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn warning(&self, title: &str, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Warning,
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn error(&self, title: &str, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Error,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

/// Buffers notifications until the host drains them (toast queue).
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all pending notifications in arrival order.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending())
    }

    /// Returns pending notifications without removing them.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.pending().clone()
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    fn pending(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        self.pending().push(notification);
    }
}
