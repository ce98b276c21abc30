//! The admin back-office context.
//!
//! Created once at startup and torn down on exit. It owns the session
//! store and hands out synchronizers that share its transport, so that every
//! panel reports auth failures to the same session.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use leadhub_core::api::ApiTransport;
use leadhub_core::collection::CollectionKind;
use leadhub_core::document::DocumentKind;
use leadhub_core::feedback::NotificationSink;
use leadhub_core::record::SyncRecord;
use leadhub_core::route::{Guard, GuardOutcome};
use leadhub_core::session::SessionState;
use leadhub_core::{HubError, Result};

use crate::feedback::FeedbackCenter;
use crate::navigation::Navigator;
use crate::session_store::SessionStore;
use crate::sync::{DocumentSynchronizer, EntityListSynchronizer};

/// Something that stops applying responses when its view goes away.
#[async_trait]
pub trait Mounted: Send + Sync {
    async fn unmount(&self);

    /// Whether a handle other than the context's own is still alive.
    fn in_use(&self) -> bool;
}

#[async_trait]
impl<R: SyncRecord> Mounted for EntityListSynchronizer<R> {
    async fn unmount(&self) {
        EntityListSynchronizer::unmount(self).await
    }

    fn in_use(&self) -> bool {
        self.handle_count() > 1
    }
}

#[async_trait]
impl Mounted for DocumentSynchronizer {
    async fn unmount(&self) {
        DocumentSynchronizer::unmount(self).await
    }

    fn in_use(&self) -> bool {
        self.handle_count() > 1
    }
}

pub struct AdminContext {
    api: Arc<dyn ApiTransport>,
    session: Arc<SessionStore>,
    navigator: Navigator,
    feedback: FeedbackCenter,
    mounted: Mutex<Vec<Arc<dyn Mounted>>>,
}

impl AdminContext {
    pub fn new(api: Arc<dyn ApiTransport>, sink: Arc<dyn NotificationSink>) -> Self {
        let session = Arc::new(SessionStore::new(api.clone()));
        Self {
            navigator: Navigator::new(session.clone()),
            feedback: FeedbackCenter::new(sink),
            session,
            api,
            mounted: Mutex::new(Vec::new()),
        }
    }

    /// Runs the one startup identity check.
    pub async fn init(&self) -> SessionState {
        self.session.initialize().await
    }

    pub fn api(&self) -> Arc<dyn ApiTransport> {
        self.api.clone()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn feedback(&self) -> &FeedbackCenter {
        &self.feedback
    }

    /// Waits for a conclusive session and applies `guard`.
    ///
    /// A redirect becomes an auth error naming the target.
    pub async fn require(&self, guard: Guard) -> Result<()> {
        let state = self.session.wait_resolved().await;
        match guard.evaluate(&state) {
            GuardOutcome::Render => Ok(()),
            GuardOutcome::Redirect(target) => Err(HubError::unauthorized(format!(
                "redirected to {}",
                target
            ))),
            GuardOutcome::Loading => Err(HubError::internal("session still loading")),
        }
    }

    /// A list synchronizer for `kind`, torn down with the context.
    pub fn list<R: SyncRecord>(&self, kind: CollectionKind) -> EntityListSynchronizer<R> {
        let sync = EntityListSynchronizer::new(self.api.clone(), kind.spec());
        self.track(Arc::new(sync.clone()));
        sync
    }

    /// A document synchronizer for `kind`, torn down with the context.
    pub fn document(&self, kind: DocumentKind) -> DocumentSynchronizer {
        let sync = DocumentSynchronizer::new(self.api.clone(), kind.spec());
        self.track(Arc::new(sync.clone()));
        sync
    }

    /// Runs one long operation with a single notification.
    ///
    /// Auth failures also invalidate the session, so the next guard check
    /// sends the admin to the login page.
    pub async fn run<T, F>(
        &self,
        message: impl Into<String>,
        success: impl Into<String>,
        operation: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let toast = self.feedback.begin(message);
        let result = operation.await;
        self.check_auth(&result);
        toast.finish(result, success)
    }

    /// Reports the failure of a short operation.
    pub fn observe<T>(&self, result: &Result<T>) {
        self.check_auth(result);
        if let Err(e) = result {
            self.feedback.error(e);
        }
    }

    fn check_auth<T>(&self, result: &Result<T>) {
        if result.as_ref().is_err_and(HubError::is_auth) {
            self.session.invalidate();
        }
    }

    /// Unmounts every synchronizer handed out so far.
    pub async fn teardown(&self) {
        let mounted: Vec<Arc<dyn Mounted>> = std::mem::take(
            &mut *self.mounted.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for view in &mounted {
            view.unmount().await;
        }
        tracing::debug!("[AdminContext] Tore down {} view(s)", mounted.len());
    }

    /// Tracks `view`, forgetting views nobody holds any more.
    fn track(&self, view: Arc<dyn Mounted>) {
        let mut mounted = self.mounted.lock().unwrap_or_else(PoisonError::into_inner);
        mounted.retain(|v| v.in_use());
        mounted.push(view);
    }
}
