// src/core/notify.rs
//! Transient user-facing notifications ("toasts").

use std::sync::Mutex;
use tracing::{info, warn};

use crate::utils::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            description: None,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Destructive,
            title: title.into(),
            description: Some(description.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.unwrap_or_default();
        match notification.level {
            NotificationLevel::Info => info!("{} {}", notification.title, description),
            NotificationLevel::Destructive => warn!("{} {}", notification.title, description),
        }
    }
}

/// Queues notifications until a front end drains them.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    queue: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *lock(&self.queue))
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.queue).push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_drains_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::info("Logged out successfully"));
        notifier.notify(Notification::destructive("Login Failed", "Invalid credentials"));

        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Info);
        assert_eq!(drained[1].title, "Login Failed");
        assert!(notifier.is_empty());
    }
}
