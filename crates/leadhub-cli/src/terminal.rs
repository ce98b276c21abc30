//! Terminal rendering and prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::Colorize;
use leadhub_application::Confirmer;
use leadhub_core::HubError;
use leadhub_core::feedback::{Notification, NotificationKind, NotificationSink};

/// Prints notifications as they change.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn show(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Loading => {
                eprintln!("{} {}", "…".dimmed(), notification.message.dimmed())
            }
            NotificationKind::Success => {
                eprintln!("{} {}", "✓".green(), notification.message.green())
            }
            NotificationKind::Error => eprintln!("{} {}", "✗".red(), notification.message.red()),
        }
    }
}

/// Asks on stdin before destructive operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let question = format!("{} [y/N] ", prompt);
        let answer = tokio::task::spawn_blocking(move || read_line(&question))
            .await
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default();
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints `label` and reads one line from stdin.
pub fn read_line(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// The given value, or a prompt for it.
pub fn value_or_prompt(value: Option<String>, label: &str) -> io::Result<String> {
    match value {
        Some(v) => Ok(v),
        None => read_line(&format!("{}: ", label)),
    }
}

/// Prints the final error of a command.
///
/// Operation errors were already shown as notifications; only auth
/// redirects and local failures are printed here.
pub fn print_failure(error: &anyhow::Error) {
    let message = match error.downcast_ref::<HubError>() {
        Some(e) if e.is_auth() => "Not logged in. Run `leadhub login` first.".to_string(),
        Some(_) => return,
        None => format!("{:#}", error),
    };
    eprintln!("{} {}", "Error:".red().bold(), message);
}
