//! Feedback center: turns operation outcomes into notifications.

use std::sync::{Arc, Mutex, PoisonError};

use leadhub_core::HubError;
use leadhub_core::feedback::{Notification, NotificationKind, NotificationSink};
use uuid::Uuid;

/// Issues notifications to one sink.
#[derive(Clone)]
pub struct FeedbackCenter {
    sink: Arc<dyn NotificationSink>,
}

impl FeedbackCenter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Starts a long-running operation with a loading notification.
    ///
    /// The returned handle moves that same notification to its outcome.
    pub fn begin(&self, message: impl Into<String>) -> OperationToast {
        let notification = Notification::new(NotificationKind::Loading, message);
        self.sink.show(&notification);
        OperationToast {
            notification,
            sink: self.sink.clone(),
        }
    }

    /// Fire-and-forget success.
    pub fn success(&self, message: impl Into<String>) {
        self.sink
            .show(&Notification::new(NotificationKind::Success, message));
    }

    /// Fire-and-forget error, worded for the admin.
    pub fn error(&self, error: &HubError) {
        self.sink
            .show(&Notification::new(NotificationKind::Error, error.user_message()));
    }
}

/// Handle to the loading notification of one operation.
///
/// Consuming methods guarantee the notification is resolved at most once.
pub struct OperationToast {
    notification: Notification,
    sink: Arc<dyn NotificationSink>,
}

impl OperationToast {
    pub fn id(&self) -> Uuid {
        self.notification.id
    }

    pub fn succeed(self, message: impl Into<String>) {
        let done = self
            .notification
            .transition(NotificationKind::Success, message);
        self.sink.show(&done);
    }

    pub fn fail(self, error: &HubError) {
        let failed = self
            .notification
            .transition(NotificationKind::Error, error.user_message());
        self.sink.show(&failed);
    }

    /// Resolves from a result, passing the result through.
    pub fn finish<T>(
        self,
        result: leadhub_core::Result<T>,
        success: impl Into<String>,
    ) -> leadhub_core::Result<T> {
        match &result {
            Ok(_) => self.succeed(success),
            Err(e) => self.fail(e),
        }
        result
    }
}

/// Keeps every notification in memory, in display order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `show` call so far.
    pub fn history(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// What is on screen: the latest version of each notification.
    pub fn visible(&self) -> Vec<Notification> {
        let mut visible: Vec<Notification> = Vec::new();
        for n in self.history() {
            match visible.iter_mut().find(|v| v.id == n.id) {
                Some(existing) => *existing = n,
                None => visible.push(n),
            }
        }
        visible
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, notification: &Notification) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}
