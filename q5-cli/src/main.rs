//! q5 CLI - run and operate the Quantum5ocial API
//!
//! - `serve`: HTTP API (profiles, feed, Q&A, messaging, marketplaces, assistant)
//! - `migrate`: apply the Postgres schema
//! - `badge`: score a Q5 badge survey offline
//! - `config`: init, show or locate the config file
//! - `completions`: shell completion scripts

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use q5_core::Q5Config;

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "q5",
    author,
    version,
    about = "Quantum5ocial API server and tooling",
    long_about = "Serve the Quantum5ocial community API backed by Postgres, apply its schema, \
                  and score Q5 badge surveys from the command line."
)]
struct Cli {
    /// Config file (default: ~/.quantum5ocial/config.toml)
    #[arg(long, short = 'c', global = true, env = "Q5_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Score a Q5 badge survey
    Badge(commands::badge::BadgeArgs),
    /// Manage q5 configuration (init, show, path)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Load `~/.quantum5ocial/.env`, then `./.env`. Existing variables win.
fn load_dotenv() {
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".quantum5ocial").join(".env"));
    }
    let _ = dotenvy::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = run(cli).await;
    tracing_setup::shutdown_otel();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, Q5Config::load(config_path)?).await?,
        Commands::Migrate(args) => {
            commands::run_migrate(args, Q5Config::load(config_path)?).await?
        }
        Commands::Badge(args) => commands::run_badge(args)?,
        Commands::Config(args) => config::run_config(args, config_path)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["q5", "badge", "--debug", "--config", "/tmp/q5.toml"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/q5.toml")));
        assert!(matches!(cli.command, Commands::Badge(_)));
    }
}
