//! User-visible notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Loading,
    Success,
    Error,
}

/// A transient message shown to the admin.
///
/// A long-running operation keeps one `id` for its whole life: the loading
/// notification is later replaced, under the same id, by its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
        }
    }

    /// The same notification moved to another stage.
    pub fn transition(&self, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: self.id,
            kind,
            message: message.into(),
        }
    }
}

/// Where notifications end up (terminal, test recorder, ...).
///
/// `show` either displays a new notification or replaces the one already
/// displayed under the same id.
pub trait NotificationSink: Send + Sync {
    fn show(&self, notification: &Notification);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl NotificationSink for SilentSink {
    fn show(&self, _notification: &Notification) {}
}
