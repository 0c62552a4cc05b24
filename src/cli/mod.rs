//! CLI module for PromptForge
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply database migrations and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::AppConfig;

/// PromptForge - metered AI prompt generation
#[derive(Parser)]
#[command(name = "promptforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Apply PostgreSQL migrations and exit
    Migrate,
}

/// Load `.env` and layered configuration. On failure the defaults are
/// returned with the error, so callers can log it once logging is up.
pub(crate) fn load_config() -> (AppConfig, Option<::config::ConfigError>) {
    dotenvy::dotenv().ok();

    match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}

/// Install logging and report a configuration load failure
pub(crate) fn init(config: &AppConfig, load_error: Option<::config::ConfigError>) {
    crate::infrastructure::logging::init_logging(&config.logging);

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["promptforge", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));

        let cli = Cli::try_parse_from(["promptforge", "migrate"]).unwrap();
        assert!(matches!(cli.command, Command::Migrate));

        assert!(Cli::try_parse_from(["promptforge", "ui"]).is_err());
    }
}
