//! OtoService license daemon.
//!
//! Runs the license engine behind one of two adapters:
//! 1. `serve`: HTTP API for transports and client back-ends
//! 2. `console`: interactive session on stdin/stdout for one actor
//!
//! Usage:
//!   oto-licensed --config oto.toml serve --listen 0.0.0.0:8080
//!   oto-licensed --admin 42 console --actor 42

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oto_gateway::{build_router, run_console, AppState, ConsolePresenter, GatewayConfig};
use oto_types::ActorId;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oto-licensed")]
#[command(about = "OtoService license issuance engine")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "OTO_CONFIG")]
    config: Option<PathBuf>,

    /// Registry file (overrides store_path)
    #[arg(long, env = "OTO_STORE")]
    store: Option<PathBuf>,

    /// Admin actor ids (overrides admin_ids)
    #[arg(long = "admin", env = "OTO_ADMIN_IDS", value_delimiter = ',')]
    admins: Vec<i64>,

    /// Master signature secret (overrides shared_secret)
    #[arg(long, env = "OTO_SHARED_SECRET", hide_env_values = true)]
    shared_secret: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Listen address (overrides listen)
        #[arg(long, env = "OTO_LISTEN")]
        listen: Option<String>,
    },
    /// Talk to the engine from the terminal
    Console {
        /// Actor id to act as
        #[arg(long)]
        actor: i64,

        /// Display name for the actor
        #[arg(long, default_value = "console")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = load_config(&args)?;
    let dispatcher = Arc::new(
        config
            .build_dispatcher()
            .context("Failed to open credential registry")?,
    );

    match args.command.unwrap_or(Command::Serve { listen: None }) {
        Command::Serve { listen } => {
            let listen = listen.unwrap_or(config.listen);
            let app = build_router(AppState::new(dispatcher));
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("Failed to bind {listen}"))?;
            info!("HTTP API listening on {}", listener.local_addr()?);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutting down");
                })
                .await
                .context("HTTP server failed")?;
        }
        Command::Console { actor, name } => {
            let presenter = ConsolePresenter::new(tokio::io::stdout());
            let stdin = BufReader::new(tokio::io::stdin());
            info!("Console session for actor {} (type /start)", actor);
            let handled = run_console(&dispatcher, ActorId::new(actor), &name, stdin, &presenter)
                .await
                .context("Console input failed")?;
            info!("Console closed after {} events", handled);
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load_from(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(store) = &args.store {
        config.store_path = Some(store.clone());
    }
    if !args.admins.is_empty() {
        config.admin_ids = args.admins.clone();
    }
    if let Some(secret) = &args.shared_secret {
        config.shared_secret = Some(secret.clone());
    }
    Ok(config)
}
