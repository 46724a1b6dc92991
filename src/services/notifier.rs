//! User-visible notifications.
//!
//! Controllers report outcomes here; the presentation layer decides how to
//! show them (toast, dialog, stderr line) and when to dismiss them.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// How long the notification stays up if the user does not dismiss it
    pub auto_hide: Option<Duration>,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            message: message.into(),
            auto_hide: Some(DEFAULT_AUTO_HIDE),
        }
    }

    /// Errors stay up until dismissed.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
            auto_hide: None,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to any number of subscribers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.tx.send(notification);
    }
}

/// Writes notifications to the log. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => error!(title = %n.title, "{}", n.message),
            Severity::Warning => warn!(title = %n.title, "{}", n.message),
            Severity::Success | Severity::Info => info!(title = %n.title, "{}", n.message),
        }
    }
}
