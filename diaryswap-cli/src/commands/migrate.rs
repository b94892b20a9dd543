//! Schema setup without starting the server

use anyhow::{Context, Result};
use clap::Parser;

use diaryswap_server::db::{create_pool_with_options, migrations};

use crate::config::DatabaseArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Create the diary tables and exit
pub async fn run_migrate(args: MigrateArgs, sql_echo: bool) -> Result<()> {
    let url = &args.database.database_url;

    let pool = create_pool_with_options(url, 1, sql_echo)
        .await
        .with_context(|| format!("Failed to open database {}", url))?;

    migrations::run(&pool)
        .await
        .context("Failed to run database migrations")?;

    pool.close().await;
    println!("Database ready: {}", url);
    Ok(())
}
