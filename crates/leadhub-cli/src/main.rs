use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leadhub_core::collection::CollectionKind;
use leadhub_core::document::DocumentKind;
use leadhub_infrastructure::{ConfigService, HubPaths};

mod args;
mod commands;
mod logging;
mod runtime;
mod terminal;

use runtime::Runtime;

#[derive(Parser)]
#[command(name = "leadhub")]
#[command(about = "LeadHub CLI - admin client for the leadership hub content site", long_about = None)]
struct Cli {
    /// Backend base URL (overrides LEADHUB_API_URL and config.toml)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as the site administrator
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List a collection (news, events, gallery, books, inquiries)
    List { collection: CollectionKind },
    /// Create a record
    Create {
        collection: CollectionKind,
        /// Field value, repeatable
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        /// File upload, repeatable
        #[arg(long = "file", value_name = "PART=PATH")]
        files: Vec<String>,
    },
    /// Update a record
    Update {
        collection: CollectionKind,
        id: String,
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        #[arg(long = "file", value_name = "PART=PATH")]
        files: Vec<String>,
    },
    /// Delete a record
    Delete {
        collection: CollectionKind,
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Singleton documents (contact, biography, home, author)
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },
    /// Counts and latest titles across collections
    Dashboard,
    /// Change the administrator e-mail and password
    Credentials {
        #[arg(long)]
        old_email: Option<String>,
        #[arg(long)]
        old_password: Option<String>,
        #[arg(long)]
        new_email: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Local client settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DocAction {
    /// Print a document merged onto its defaults
    Show { document: DocumentKind },
    /// Edit fields of a document and save it
    Set {
        document: DocumentKind,
        /// Dotted field path and value, repeatable (e.g. profile.firstName=Ram)
        #[arg(long = "field", value_name = "PATH=VALUE")]
        fields: Vec<String>,
        #[arg(long = "file", value_name = "PART=PATH")]
        files: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Store the backend base URL
    SetUrl { url: String },
    /// Store the request timeout in seconds (0 clears it)
    SetTimeout { seconds: u64 },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let paths = HubPaths::new_default()?;
    // Flushes the log file when dropped.
    let _log_guard = logging::init(&paths.logs_dir(), cli.verbose)?;

    let config_service = ConfigService::new(&paths);
    if let Commands::Config { action } = &cli.command {
        commands::config::run(&config_service, action, cli.api_url.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = config_service.effective(|key| std::env::var(key).ok(), cli.api_url.as_deref())?;
    tracing::info!("[Main] Using backend {}", config.base_url());

    let runtime = Runtime::start(&paths, &config)?;
    let result = commands::dispatch(&runtime, cli.command).await;
    runtime.shutdown().await?;

    Ok(exit_code(result))
}

/// Reports a failed command. Returned rather than exiting so the log
/// guard in `main` still drops.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("[Main] Command failed: {:#}", e);
            terminal::print_failure(&e);
            ExitCode::FAILURE
        }
    }
}
