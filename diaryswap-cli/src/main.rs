//! diaryswap CLI - run the diary exchange server
//!
//! - `serve`: HTTP API (exchange, comments, image uploads, /resources)
//! - `migrate`: create the database schema and exit

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use config::LogArgs;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "diaryswap",
    author,
    version,
    about = "Diary exchange server: submit a diary, receive someone else's"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces via OpenTelemetry OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create the database schema and exit
    Migrate(commands::migrate::MigrateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so env-backed flags see .env values
    let dotenv_path = config::load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        level: config::parse_log_level(&cli.log.log_level)?,
        sql_echo: cli.log.sql_echo,
    })?;

    match &dotenv_path {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::debug!("No .env file found, using environment variables only"),
    }

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args, cli.log.sql_echo).await,
        Commands::Migrate(args) => commands::run_migrate(args, cli.log.sql_echo).await,
    };

    tracing_setup::shutdown_otel();
    result
}
