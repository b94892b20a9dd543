//! HTTP server command
//!
//! Opens the database, applies migrations, and runs the diary API until
//! Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use diaryswap_server::db::{create_pool_with_options, migrations};
use diaryswap_server::http::server::{DEFAULT_CORS_ORIGIN, DEFAULT_MAX_UPLOAD_BYTES};
use diaryswap_server::{run_server, ServerConfig};

use crate::config::DatabaseArgs;

/// Connections kept by the server's pool
const POOL_MAX_CONNECTIONS: u32 = 5;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Directory served under /resources; uploads go to its images/ folder
    #[arg(long, env = "RESOURCES_DIR_PATH", default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Allowed CORS origin (repeatable, or comma-separated in CORS_ORIGINS)
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_CORS_ORIGIN
    )]
    pub cors_origins: Vec<String>,

    /// Allow permissive CORS (all origins, no credentials) - use with caution
    #[arg(long, env = "CORS_PERMISSIVE")]
    pub cors_permissive: bool,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, sql_echo: bool) -> Result<()> {
    let bind_addr = resolve_bind_addr(&args.host, args.port).await?;

    let pool = create_pool_with_options(&args.database.database_url, POOL_MAX_CONNECTIONS, sql_echo)
        .await
        .with_context(|| format!("Failed to open database {}", args.database.database_url))?;

    migrations::run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let config = ServerConfig {
        bind_addr,
        resources_dir: args.resources_dir,
        cors_origins: args
            .cors_origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        cors_permissive: args.cors_permissive,
        max_upload_bytes: args.max_upload_bytes,
    };

    tracing::info!("Starting diaryswap server on {}", bind_addr);

    // Run server (blocks until shutdown)
    run_server(pool.clone(), config)
        .await
        .context("Server error")?;

    pool.close().await;
    Ok(())
}

/// Resolve HOST:PORT, allowing host names such as `localhost`
async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve bind address {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))
}
