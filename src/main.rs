#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crate::commands::config::ConfigCommands;
use elpicker::{Combinator, OutputFormat, PickerError};

// Exit codes
const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "elpicker")]
#[command(about = "Pick page elements and copy CSS selectors for them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.elpicker/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the picker selector for elements of a page snapshot
    Selector {
        /// JSON page snapshot
        snapshot: PathBuf,

        /// CSS query locating the element(s)
        query: String,

        /// Generate for all matching elements instead of just the first
        #[arg(long)]
        all: bool,

        /// Generate for the match at a specific index (0-based)
        #[arg(long, conflicts_with = "all")]
        index: Option<usize>,

        /// Separator between segments (overrides the config)
        #[arg(long)]
        combinator: Option<Combinator>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Replay a scripted picking session against a page snapshot
    Replay {
        /// JSON page snapshot
        snapshot: PathBuf,

        /// JSON session script
        script: PathBuf,

        /// Base URL for resolving followed links
        #[arg(long)]
        base_url: Option<String>,

        /// Override the snapshot viewport (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Copy picked selectors to the system clipboard
        #[arg(long)]
        system_clipboard: bool,

        /// Reject clipboard writes so the fallback copy is used
        #[arg(long, conflicts_with = "system_clipboard")]
        deny_clipboard: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Manage the picker configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let picker_err = PickerError::from_anyhow(err);

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": picker_err.to_string(),
                "exit_code": picker_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", picker_err);
            std::process::exit(picker_err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Initialize tracing to stderr (so JSON output to stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elpicker=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Selector {
            snapshot,
            query,
            all,
            index,
            combinator,
            format,
        } => commands::selector::handle_selector(
            snapshot,
            query,
            all,
            index,
            combinator,
            format,
            cli.config,
        )?,

        Commands::Replay {
            snapshot,
            script,
            base_url,
            viewport,
            system_clipboard,
            deny_clipboard,
            format,
        } => {
            commands::replay::handle_replay(
                snapshot,
                script,
                base_url,
                viewport,
                system_clipboard,
                deny_clipboard,
                format,
                cli.config,
            )
            .await?
        }

        Commands::Config { command } => commands::config::handle_config(command, cli.config)?,
    }

    Ok(())
}
