use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warden::prelude::*;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// A terminal host for a Warden session. Every run starts the way an app
/// launch would: the persisted session is validated first.
#[derive(Parser)]
#[command(name = "warden", version)]
struct Cli {
    /// Session file. Overrides WARDEN_STORE_PATH.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Accept any non-empty credentials (demo mode).
    #[arg(long)]
    accept_all: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current session.
    Status,
    /// Sign in.
    Login { identifier: String, secret: String },
    /// Sign out.
    Logout,
    /// Re-validate the session with the authority.
    Refresh,
    /// Launch as if opened at URL (honors `?logout=true`).
    Open { url: String },
}

const DEFAULT_STORE: &str = "warden-session.json";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn describe(snapshot: &SessionSnapshot) -> String {
    match &snapshot.user {
        Some(user) => format!(
            "{} as {} <{}> (token {})",
            snapshot.status,
            user.display_name(),
            user.email,
            snapshot.token.as_deref().map(abbreviate).unwrap_or_default()
        ),
        None => snapshot.status.to_string(),
    }
}

fn abbreviate(token: &str) -> String {
    let head: String = token.chars().take(8).collect();
    format!("{head}…")
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = WardenConfig::from_env()?;
    if let Some(path) = cli.store {
        config.store_path = Some(path);
    }
    if config.store_path.is_none() {
        config.store_path = Some(PathBuf::from(DEFAULT_STORE));
    }

    let mut builder = Warden::builder().config(config);
    if cli.accept_all {
        builder = builder.login_mode(LoginMode::AcceptAll);
    }
    let manager = builder.build_with_file_store()?;

    let _subscription = manager.subscribe(|snapshot| {
        println!("→ {}", describe(snapshot));
    });

    match cli.command {
        Command::Status => {
            manager.startup().await;
        }
        Command::Login { identifier, secret } => {
            manager.startup().await;
            if let Err(e) = manager.login(&identifier, &secret).await {
                if e.is_unreachable() {
                    eprintln!("could not reach the identity service: {e}");
                } else {
                    eprintln!("login failed: {e}");
                }
                std::process::exit(1);
            }
        }
        Command::Logout => {
            manager.startup().await;
            manager.logout().await;
        }
        Command::Refresh => {
            manager.startup().await;
            match manager.refresh().await {
                RefreshOutcome::Refreshed => {}
                RefreshOutcome::Retained(e) => eprintln!("kept current session: {e}"),
                RefreshOutcome::NoSession => eprintln!("not signed in"),
            }
        }
        Command::Open { url } => {
            let mut location = Url::parse(&url)?;
            manager.startup_at(&mut location).await;
            println!("location: {location}");
        }
    }

    Ok(())
}
