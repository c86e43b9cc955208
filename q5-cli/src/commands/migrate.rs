//! `q5 migrate` - apply the database schema and exit

use anyhow::{Context, Result};
use clap::Parser;

use q5_core::Q5Config;
use q5_server::db::{create_pool_with_options, migrations};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: Q5Config) -> Result<()> {
    let url = args.database_url.unwrap_or(config.database.url);

    let pool = create_pool_with_options(&url, 1)
        .await
        .context("Failed to connect to database")?;
    migrations::run(&pool)
        .await
        .context("Failed to apply schema")?;
    pool.close().await;

    println!("schema up to date");
    Ok(())
}
