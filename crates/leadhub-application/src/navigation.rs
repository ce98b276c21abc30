//! Navigation over the route table.

use std::sync::Arc;

use leadhub_core::route::{self, Guard, GuardOutcome};

use crate::session_store::SessionStore;

/// Resolves requested paths against the session.
#[derive(Clone)]
pub struct Navigator {
    session: Arc<SessionStore>,
}

impl Navigator {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Where `path` lands right now; `None` while the session is loading.
    pub fn land(&self, path: &str) -> Option<String> {
        route::resolve(path, &self.session.state())
    }

    /// Waits for a conclusive session, then resolves `path`.
    pub async fn navigate(&self, path: &str) -> String {
        let state = self.session.wait_resolved().await;
        let target = route::resolve(path, &state).unwrap_or_else(|| route::LOGIN_PATH.to_string());
        if target != path {
            tracing::debug!("[Navigator] {} -> {}", path, target);
        }
        target
    }

    pub fn evaluate(&self, guard: Guard) -> GuardOutcome {
        guard.evaluate(&self.session.state())
    }
}
