//! Alarmbot CLI - console front-end for the alarm troubleshooting assistant.

mod chat;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use alarmbot_core::Config;
use commands::{Commands, handle_command};

/// Alarmbot CLI - network alarm troubleshooting from the terminal
#[derive(Parser)]
#[command(name = "alarmbot-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a custom config file (overrides default search locations)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the conversation on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;

    handle_command(args.command, &config)
}
