//! MetaCollab CLI - Two-party escrow agreements on an in-memory chain
//!
//! # Quick Start
//!
//! ```bash
//! # Full lifecycle: deploy, settle one gig, escalate another
//! metacollab demo
//!
//! # Only the JSON event log
//! metacollab demo --json
//!
//! # Address of a deterministic label wallet
//! metacollab address --label funder
//!
//! # Where a factory's CREATE2 clone for a salt will land
//! metacollab predict --factory 0x... --implementation 0x... --salt 0x...
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod display;

use crate::config::{CliConfig, LoggingConfig};

const ZERO_SALT: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

/// MetaCollab CLI - Funder/doer escrow with co-signed gigs
#[derive(Parser)]
#[command(name = "metacollab")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true, env = "METACOLLAB_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "METACOLLAB_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, global = true, env = "METACOLLAB_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full agreement lifecycle and print the event log
    Demo {
        /// Print only the JSON event log
        #[arg(long)]
        json: bool,
    },

    /// Show the address of a deterministic label wallet
    Address {
        /// Wallet label
        #[arg(short, long)]
        label: String,
    },

    /// Predict the address of a deterministic agreement clone
    Predict {
        /// Factory address
        #[arg(long)]
        factory: String,

        /// Agreement template address
        #[arg(long)]
        implementation: String,

        /// 32-byte salt
        #[arg(long, default_value = ZERO_SALT)]
        salt: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cli_config = CliConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        cli_config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        cli_config.logging.format = format;
    }

    init_logging(&cli_config.logging);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting MetaCollab CLI");

    match cli.command {
        Commands::Demo { json } => commands::demo::run(&cli_config, json),
        Commands::Address { label } => commands::address::run(&label),
        Commands::Predict {
            factory,
            implementation,
            salt,
        } => commands::predict::run(&factory, &implementation, &salt),
    }
}

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr so
/// command output stays pipeable.
fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_read_environment() {
        let command = Cli::command();
        let env = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|name| name.to_str())
                .map(str::to_owned)
        };
        assert_eq!(env("config").as_deref(), Some("METACOLLAB_CONFIG"));
        assert_eq!(env("log_level").as_deref(), Some("METACOLLAB_LOG_LEVEL"));
        assert_eq!(env("log_format").as_deref(), Some("METACOLLAB_LOG_FORMAT"));
    }
}
