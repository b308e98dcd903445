//! Veridian CLI: the main entry point.
//!
//! Commands:
//! - `serve`: start the HTTP API server
//! - `chat`: run one message through the chat pipeline
//! - `config`: show, validate, or locate configuration
//! - `seed`: write test data into the file store

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "veridian",
    about = "Veridian: home energy advisor backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a single chat message as a user
    Chat {
        /// User ID (rate-limit key and context lookup)
        #[arg(short, long, default_value = "test-user")]
        user: String,

        /// The message to send
        #[arg(short, long)]
        message: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Seed the file store with a test user and audit
    Seed {
        /// Store directory (defaults to the configured store path)
        #[arg(short, long)]
        dir: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the built-in defaults as TOML
    Default,
    /// Validate the configuration and report warnings
    Validate,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment from .env");
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { user, message } => commands::chat::run(user, message).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Default => commands::config_cmd::defaults().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
        Commands::Seed { dir } => commands::seed::run(dir).await?,
    }

    Ok(())
}
