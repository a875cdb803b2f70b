//! User-facing notifications
//!
//! Submissions end with exactly one success or failure notification. The
//! CLI routes them to the log; tests record them.

use std::fmt;

/// Text of the success notification
pub const SUCCESS_MESSAGE: &str = "Claim processed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Failure,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Success => f.write_str("success"),
            NotificationLevel::Failure => f.write_str("failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Success,
            message: message.to_string(),
        });
    }

    fn failure(&self, message: &str) {
        self.notify(Notification {
            level: NotificationLevel::Failure,
            message: message.to_string(),
        });
    }
}

/// Formats the failure text shown for a failed submission
pub fn failure_message(error: &impl fmt::Display) -> String {
    format!("Connection Error: {error}")
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(target: "fnol::notify", "{}", notification.message)
            }
            NotificationLevel::Failure => {
                tracing::error!(target: "fnol::notify", "{}", notification.message)
            }
        }
    }
}

/// Mock implementation for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// Keeps every notification in order
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        pub fn last(&self) -> Option<Notification> {
            self.notifications().pop()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        }
    }
}
