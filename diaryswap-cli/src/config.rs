//! Configuration shared by every subcommand
//!
//! Sources, highest priority first: command-line flags, process
//! environment, `.env` in the working directory, built-in defaults.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use tracing_subscriber::filter::LevelFilter;

/// Default SQLite database, relative to the working directory
pub const DEFAULT_DATABASE_URL: &str = "sqlite://sqlite.db";

/// Load `.env` from the current directory, if present.
///
/// dotenvy never overwrites variables that are already set, so the real
/// environment keeps priority. Runs before tracing is up, so the caller
/// logs the returned path.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Logging options (global)
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Default log level (TRACE, DEBUG, INFO, WARNING, ERROR); RUST_LOG overrides
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO", global = true)]
    pub log_level: String,

    /// Log every SQL statement
    #[arg(
        long,
        env = "SQL_ECHO",
        default_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set,
        global = true
    )]
    pub sql_echo: bool,
}

/// Database connection options
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// SQLite connection URL (file is created if missing)
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}

/// Parse a log level name, also accepting WARNING, CRITICAL, FATAL and NOTSET.
pub fn parse_log_level(level: &str) -> Result<LevelFilter> {
    let normalized = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        other => other.to_string(),
    };

    normalized
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("invalid LOG_LEVEL '{}'", level))
}
