//! ChatClaw CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive chat or single-message mode
//! - `memory`: Inspect or clear a session's memory
//! - `tools`: List the registered tools
//! - `config`: Show or initialize the configuration

use chatclaw_config::{AppConfig, LoggingConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "chatclaw",
    about = "ChatClaw: tool-using chat agent with conversation memory",
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

/// Identifies the conversation a command works on.
#[derive(clap::Args, Clone)]
struct SessionArgs {
    /// User the session belongs to
    #[arg(long, default_value = "local")]
    user: String,

    /// Session identifier
    #[arg(long, default_value = "default")]
    session: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Inspect or clear conversation memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// List the tools available to the agent
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Print the stored summary and recent messages
    Show {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Ask the model for a digest of the conversation
    Summary {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Delete the session's memory
    Clear {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl SessionArgs {
    fn key(&self) -> chatclaw_core::SessionKey {
        chatclaw_core::SessionKey::new(&self.user, &self.session)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // `config init` must work even when the existing file is broken.
    if let Commands::Config {
        action: ConfigAction::Init { force },
    } = &cli.command
    {
        init_tracing(&LoggingConfig::default(), cli.verbose);
        return commands::config_cmd::init(*force).await;
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Chat { message, session } => {
            commands::chat::run(&config, message, session.key()).await?
        }
        Commands::Memory { action } => match action {
            MemoryAction::Show { session } => commands::memory::show(&config, &session.key()).await?,
            MemoryAction::Summary { session } => {
                commands::memory::summary(&config, &session.key()).await?
            }
            MemoryAction::Clear { session } => {
                commands::memory::clear(&config, &session.key()).await?
            }
        },
        Commands::Tools => commands::tools::list(&config).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config).await?,
            ConfigAction::Init { force } => commands::config_cmd::init(force).await?,
        },
    }

    Ok(())
}

/// Install the tracing subscriber. Logs go to stderr so replies stay clean on stdout.
///
/// `RUST_LOG` wins over `-v`, which wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
