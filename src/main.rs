//! Daily Wordle - Unified CLI
//!
//! Runs the HTTP game server and the database maintenance commands.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use daily_wordle::{
    AppState, Backend, GameRepository, MemoryStore, ServerConfig, SessionManager, StorageMode,
    SystemClock, router, seed_defaults,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,daily_wordle=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            port,
            host,
            db_path,
            memory,
        } => {
            if let Some(port) = port {
                config.set_port(port);
            }
            if let Some(host) = host {
                config.set_host(host);
            }
            if let Some(db_path) = db_path {
                config.set_db_path(db_path);
            }
            if memory {
                config.set_storage(StorageMode::Memory);
            }
            run_server(config).await
        }
        Command::Migrate { db_path } => {
            if let Some(db_path) = db_path {
                config.set_db_path(db_path);
            }
            open_repository(&config)?;
            info!(db_path = %config.db_path(), "Database is up to date");
            Ok(())
        }
        Command::Seed { db_path } => {
            if let Some(db_path) = db_path {
                config.set_db_path(db_path);
            }
            let repository = open_repository(&config)?;
            let summary = seed_defaults(&repository, &SystemClock)?;
            info!(
                players = summary.players_created(),
                words = summary.words_created(),
                "Seed finished"
            );
            Ok(())
        }
    }
}

/// Opens the SQLite database and applies pending migrations.
#[instrument(skip(config), fields(db_path = %config.db_path()))]
fn open_repository(config: &ServerConfig) -> Result<GameRepository> {
    let repository = GameRepository::new(config.db_path().clone())?;
    let applied = repository
        .run_migrations()
        .with_context(|| format!("Migrating {}", config.db_path()))?;
    info!(applied, "Database ready");
    Ok(repository)
}

/// Run the HTTP game server
#[instrument(skip(config), fields(storage = %config.storage()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    match config.storage() {
        StorageMode::Sqlite => {
            let repository = open_repository(&config)?;
            serve(repository, &config).await
        }
        StorageMode::Memory => {
            warn!("Using in-memory storage, data is lost on exit");
            serve(MemoryStore::new(), &config).await
        }
    }
}

async fn serve<B: Backend>(backend: B, config: &ServerConfig) -> Result<()> {
    if *config.seed_defaults() {
        seed_defaults(&backend, &SystemClock)?;
    }

    let state = Arc::new(AppState::from_sessions(SessionManager::new(backend)));
    let app = router(state);

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {}", addr))?;
    info!(addr = %addr, "Server ready at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
