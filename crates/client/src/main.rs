// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::error;

use tourbook::{ClientConfig, Session, SessionEvent};

#[derive(Parser)]
#[command(name = "tourbook", about = "Tour-booking API client")]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with email and password.
    Login { email: String, password: String },
    /// Create an account.
    Register { name: String, email: String, password: String },
    /// End the session (best-effort server-side, always local).
    Logout,
    /// Show the locally persisted identity.
    Whoami,
    /// Gated GET to an API path (e.g. /tours).
    Get { path: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // reqwest is built without a bundled TLS provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let session = Session::with_file_store(&cli.config);

    // The CLI is the UI layer: it answers session-expired prompts and
    // reports forced logouts.
    let prompt_rx = session.coordinator().register_prompt_handler();
    let _prompt_task = tourbook::prompt::spawn_terminal_prompt(prompt_rx);

    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::LoggedOut { reason }) => {
                    eprintln!("session ended ({reason})");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("logged in as {} <{}>", user.name, user.email);
        }
        Command::Register { name, email, password } => {
            let user = session.register(&name, &email, &password).await?;
            println!("registered {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        Command::Whoami => match session.current_user()? {
            Some(user) => println!("{} <{}> role={}", user.name, user.email, user.role),
            None => println!("not logged in"),
        },
        Command::Get { path } => {
            let resp = session.get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&resp.body)?);
            if !resp.is_success() {
                anyhow::bail!("request failed: {}", resp.message());
            }
        }
    }

    Ok(())
}
