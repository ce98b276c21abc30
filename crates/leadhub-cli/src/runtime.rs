//! One CLI run: transport, persisted session and the admin context.

use std::sync::Arc;

use anyhow::Result;
use leadhub_application::AdminContext;
use leadhub_core::config::ClientConfig;
use leadhub_infrastructure::{CookieFile, HubPaths};
use leadhub_interaction::HttpApiClient;

use crate::terminal::TerminalSink;

pub struct Runtime {
    pub ctx: AdminContext,
    client: Arc<HttpApiClient>,
    cookies: CookieFile,
}

impl Runtime {
    /// Builds the transport and restores the session cookie of an earlier run.
    pub fn start(paths: &HubPaths, config: &ClientConfig) -> Result<Self> {
        let client = Arc::new(HttpApiClient::new(config)?);
        let cookies = CookieFile::new(paths.cookie_file());
        if let Some(saved) = cookies.load()? {
            client.import_cookies(&saved)?;
        }

        let ctx = AdminContext::new(client.clone(), Arc::new(TerminalSink));
        Ok(Self {
            ctx,
            client,
            cookies,
        })
    }

    /// Unmounts views and persists (or clears) the session cookie.
    pub async fn shutdown(&self) -> Result<()> {
        self.ctx.teardown().await;

        let session_alive = !matches!(
            self.ctx.session().state(),
            leadhub_core::session::SessionState::Unauthenticated
        );
        match self.client.export_cookies()? {
            Some(cookies) if session_alive => self.cookies.save(&cookies)?,
            _ => self.cookies.clear()?,
        }
        Ok(())
    }
}
