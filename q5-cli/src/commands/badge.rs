//! `q5 badge` - score a Q5 badge survey offline

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use q5_core::badge::{compute_q5_badge, BadgeInput, MAX_SIGNAL};

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct BadgeArgs {
    /// Involvement in the quantum community (0-4)
    #[arg(long, default_value_t = 0)]
    pub involvement: u8,

    /// Contribution to the field (0-4)
    #[arg(long, default_value_t = 0)]
    pub contribution: u8,

    /// Impact of the work (0-4)
    #[arg(long, default_value_t = 0)]
    pub impact: u8,

    /// Current role, e.g. "Researcher"
    #[arg(long, default_value = "")]
    pub role: String,

    /// Highest education, e.g. "PhD" or "Master"
    #[arg(long, default_value = "")]
    pub education: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run_badge(args: BadgeArgs) -> Result<()> {
    let input = BadgeInput::new(
        args.involvement,
        args.contribution,
        args.role,
        args.education,
        args.impact,
    )
    .with_context(|| format!("signals range from 0 to {MAX_SIGNAL}"))?;

    let badge = compute_q5_badge(&input);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&badge)?),
        OutputFormat::Text => {
            println!("Level {} - {}", badge.level, badge.label);
            println!("Score:  {}", badge.score);
            println!("Review: {}", badge.review_status.as_str());
            println!("{}", badge.rationale);
        }
    }

    Ok(())
}
