//! wachat - terminal client for a WhatsApp-style chat backend
//!
//! Polls the backend's REST API for conversations and messages and lets the
//! operator read and reply from the terminal.

mod api;
mod config;
mod models;
mod sync;
mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, API_URL_ENV};

#[derive(Parser)]
#[command(name = "wachat")]
#[command(about = "Terminal client for a WhatsApp-style chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the chat backend (overrides the config file)
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations
    Conversations {
        /// Maximum number of conversations to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Only show conversations whose contact name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Read messages from a conversation
    Read {
        /// Conversation ID (from `conversations` output)
        conversation_id: String,

        /// Do not mark the conversation as read afterwards
        #[arg(long)]
        no_mark_read: bool,
    },

    /// Send a message
    Send {
        /// Conversation ID (from `conversations` output)
        #[arg(short, long)]
        to: String,

        /// Message content
        message: String,
    },

    /// Mark a conversation as read
    MarkRead {
        /// Conversation ID (from `conversations` output)
        conversation_id: String,
    },

    /// Launch the terminal user interface
    Tui,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?.with_api_url(cli.api_url);

    // The TUI owns the screen, so its logs go to the in-app debug pane.
    let capture = matches!(cli.command, Commands::Tui).then(tui::LogBuffer::new);
    init_logging(cli.verbose, capture.clone());

    match cli.command {
        Commands::Conversations { limit, filter } => {
            tracing::info!("Fetching conversations...");
            api::list_conversations(&config, limit, filter.as_deref()).await?;
        }
        Commands::Read {
            conversation_id,
            no_mark_read,
        } => {
            api::read_messages(&config, &conversation_id, !no_mark_read).await?;
        }
        Commands::Send { to, message } => {
            tracing::info!("Sending message...");
            api::send_message(&config, &to, &message).await?;
        }
        Commands::MarkRead { conversation_id } => {
            api::mark_read(&config, &conversation_id).await?;
        }
        Commands::Config { init } => {
            show_config(&config, init)?;
        }
        Commands::Tui => {
            tui::run(&config, capture.unwrap_or_default()).await?;
        }
    }

    Ok(())
}

/// Initialize logging to stderr, or into `capture` when given.
fn init_logging(verbose: bool, capture: Option<tui::LogBuffer>) {
    let filter = if verbose { "debug" } else { "info" };
    let ansi = capture.is_none();
    let writer = match capture {
        Some(logs) => BoxMakeWriter::new(logs),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .init();
}

fn show_config(config: &Config, init: bool) -> Result<()> {
    if init {
        let path = config.save()?;
        println!("Wrote {}", path.display());
    } else {
        println!("Config file: {}", Config::config_path()?.display());
    }
    println!();
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}
