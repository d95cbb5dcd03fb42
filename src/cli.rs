//! Command-line interface for daily_wordle.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Daily Wordle - five-letter word game server
#[derive(Parser, Debug)]
#[command(name = "daily_wordle")]
#[command(about = "Daily five-letter word guessing game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to daily_wordle.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,

        /// Keep all data in memory instead of SQLite
        #[arg(long)]
        memory: bool,
    },

    /// Apply pending database migrations
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Create the default accounts and word list
    Seed {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },
}
