//! User-facing notifications raised by conversions

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ConversionComplete,
    ConversionFailed,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn conversion_complete() -> Self {
        Self {
            kind: NotificationKind::ConversionComplete,
            title: "Conversion Complete".to_string(),
            description: "Historical rates have been fetched successfully.".to_string(),
        }
    }

    pub fn conversion_failed() -> Self {
        Self {
            kind: NotificationKind::ConversionFailed,
            title: "Conversion Failed".to_string(),
            description: "There was an error fetching the rates. Please try again.".to_string(),
        }
    }

    pub fn fetch_failed(source: &str, target: &str) -> Self {
        Self {
            kind: NotificationKind::FetchFailed,
            title: "Rate Fetch Failed".to_string(),
            description: format!("Failed to fetch {source}/{target} rates. Please try again."),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind != NotificationKind::ConversionComplete
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Collects notifications in memory, for headless callers and tests.
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications
            .lock()
            .map(|n| n.iter().map(|n| n.kind).collect())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}
