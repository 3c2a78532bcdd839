use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opendecks::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "opendecks",
    version,
    about = "Open-decks DJ kiosk: signups and fair slot draws",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format; overrides the config file
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive kiosk session with automatic draws
    Kiosk,

    /// Print tonight's windows, slots and draw countdowns
    Windows {
        /// Evaluate at this instant instead of now (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format.as_str().to_string();
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!(zone = %config.kiosk.timezone, "opendecks starting");

    match cli.command {
        Commands::Kiosk => {
            tracing::info!(
                trigger = config.trigger.enabled,
                cooldown = config.kiosk.cooldown_enabled,
                "Starting kiosk command"
            );
            commands::kiosk(config).await?;
        }

        Commands::Windows { at } => {
            tracing::info!(at = ?at, "Starting windows command");
            commands::windows(&config, at.as_deref())?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    tracing::info!("opendecks finished");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env();
            config
                .validate()
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            Ok(config)
        }
        None => Config::from_env().context("Invalid configuration from environment"),
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("opendecks=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("opendecks={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
