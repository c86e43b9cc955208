//! `q5 serve` - run the HTTP API
//!
//! Loads config, opens the pool, applies the schema, wires the assistant
//! backend when configured, then serves until ctrl-c.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use q5_core::Q5Config;
use q5_server::db::{create_pool_with_options, migrations};
use q5_server::{run_server, AppState, OpenAiChatClient, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config and Q5_BIND)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Skip applying the schema on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn apply(&self, config: &mut Q5Config) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: Q5Config) -> Result<()> {
    args.apply(&mut config);

    if config.database.url.trim().is_empty() {
        anyhow::bail!(
            "database URL not set. Use --database-url, DATABASE_URL or [database].url in {}",
            Q5Config::default_path().display()
        );
    }

    tracing::info!(bind = %config.server.bind, "starting quantum5ocial server");

    let pool = create_pool_with_options(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.skip_migrations {
        tracing::info!("skipping migrations");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to apply schema")?;
    }

    let mut state = AppState::new(pool);
    match OpenAiChatClient::from_config(&config.assistant).context("Invalid assistant config")? {
        Some(client) => {
            tracing::info!(model = %config.assistant.model, "assistant enabled");
            state = state.with_assistant(Arc::new(client));
        }
        None => tracing::info!("assistant disabled: no API key"),
    }

    run_server(state, ServerConfig::from(&config.server))
        .await
        .context("Server error")?;

    Ok(())
}
