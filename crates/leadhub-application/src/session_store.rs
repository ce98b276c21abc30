//! Auth session store.
//!
//! Holds the process-wide [`SessionState`]. The identity check runs once per
//! store; concurrent callers of [`SessionStore::initialize`] share that one
//! request. Subsequent transitions come from login, logout and auth
//! failures reported by the panels.

use std::sync::Arc;

use leadhub_core::api::{ApiTransport, RequestBody};
use leadhub_core::envelope::ensure_success;
use leadhub_core::session::{Credentials, CredentialsUpdate, SessionState, User};
use leadhub_core::{HubError, Result};
use tokio::sync::{OnceCell, watch};

pub const CHECK_PATH: &str = "/check";
pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";
pub const CREDENTIALS_PATH: &str = "/setting/updatecredentails";

pub struct SessionStore {
    api: Arc<dyn ApiTransport>,
    state: watch::Sender<SessionState>,
    initialized: OnceCell<()>,
}

impl SessionStore {
    /// Creates a store in the `Loading` state. No request is sent yet.
    pub fn new(api: Arc<dyn ApiTransport>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            api,
            state,
            initialized: OnceCell::new(),
        }
    }

    /// Runs the startup identity check, at most once.
    pub async fn initialize(&self) -> SessionState {
        self.initialized
            .get_or_init(|| async {
                let resolved = self.check().await;
                // A login that finished meanwhile already holds the newer state.
                let applied = self.state.send_if_modified(|state| {
                    if state.is_loading() {
                        *state = resolved.clone();
                        true
                    } else {
                        false
                    }
                });
                if applied {
                    tracing::info!(
                        "[SessionStore] Startup check resolved: {}",
                        describe(&resolved)
                    );
                } else {
                    tracing::debug!("[SessionStore] Startup check superseded");
                }
            })
            .await;
        self.state()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Waits until the state is conclusive (not `Loading`).
    pub async fn wait_resolved(&self) -> SessionState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        }
    }

    /// Logs in, then re-validates through the identity check.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;

        let body = serde_json::to_value(credentials)?;
        let response = self
            .api
            .post(LOGIN_PATH, RequestBody::Json(body))
            .await
            .map_err(rejected_credentials)?;
        ensure_success(&response.body)?;

        let resolved = self.check().await;
        self.state.send_replace(resolved.clone());
        // Later initialize() calls keep this result.
        let _ = self.initialized.set(());

        match resolved {
            SessionState::Authenticated(user) => {
                tracing::info!("[SessionStore] Logged in as {}", user.display_name());
                Ok(user)
            }
            _ => Err(HubError::server(
                "Login succeeded but the session could not be verified",
            )),
        }
    }

    /// Logs out. Local state is cleared even when the request fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self
            .api
            .post(LOGOUT_PATH, RequestBody::Empty)
            .await
            .and_then(|response| ensure_success(&response.body));
        self.state.send_replace(SessionState::Unauthenticated);
        tracing::info!("[SessionStore] Logged out");
        result
    }

    /// Drops the session after an auth failure.
    pub fn invalidate(&self) {
        let previous = self.state.send_replace(SessionState::Unauthenticated);
        if previous.is_authenticated() {
            tracing::warn!("[SessionStore] Session invalidated");
        }
    }

    /// Replaces the admin login.
    pub async fn update_credentials(&self, update: &CredentialsUpdate) -> Result<()> {
        update.validate()?;
        let body = serde_json::to_value(update)?;
        let response = self
            .api
            .put(CREDENTIALS_PATH, RequestBody::Json(body))
            .await
            .map_err(rejected_credentials)?;
        ensure_success(&response.body)
    }

    async fn check(&self) -> SessionState {
        match self.api.get(CHECK_PATH).await {
            Ok(response) => match User::from_check_response(&response.body) {
                Ok(Some(user)) => SessionState::Authenticated(user),
                Ok(None) => SessionState::Unauthenticated,
                Err(e) => {
                    tracing::warn!("[SessionStore] Unreadable identity response: {}", e);
                    SessionState::Unauthenticated
                }
            },
            Err(e) => {
                tracing::debug!("[SessionStore] Identity check failed: {}", e);
                SessionState::Unauthenticated
            }
        }
    }
}

/// A 401 from a credentials form means the submitted credentials are wrong,
/// not that the session ended. The server's text is kept for the admin.
fn rejected_credentials(err: HubError) -> HubError {
    match err {
        HubError::Unauthorized(message) => HubError::server_status(401, message),
        other => other,
    }
}

fn describe(state: &SessionState) -> &str {
    match state {
        SessionState::Loading => "loading",
        SessionState::Authenticated(user) => user.display_name(),
        SessionState::Unauthenticated => "anonymous",
    }
}
