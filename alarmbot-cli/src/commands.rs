//! Subcommands for the `alarmbot-cli` binary.
//!
//! Defines the [`Commands`] enum parsed by `clap` and the [`handle_command`]
//! dispatcher that runs the interactive chat, one-shot FAQ answers, and the
//! knowledge table listing.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use alarmbot_core::text::truncate;
use alarmbot_core::{Config, Dialogue, FaqMatcher, KnowledgeTable, MemorySessionStore};

use crate::chat::run_chat;

/// Top-level subcommands for the `alarmbot-cli` binary.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Walk through the device, category and alarm prompts interactively
    Chat {
        /// Session name (sessions are keyed as `cli:<name>`)
        #[arg(short, long, default_value = "local")]
        name: String,
    },
    /// Answer a free-text question from the FAQ
    Ask {
        /// Question text
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// List devices, categories, alarms and published coverage
    Alarms,
}

/// Handle a subcommand.
pub(crate) fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Chat { name } => {
            let table = KnowledgeTable::builtin().context("Failed to build knowledge table")?;
            let dialogue = Dialogue::new(
                Arc::new(table),
                Arc::new(MemorySessionStore::new()),
                config.dialogue.unsupported_category,
            );
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_chat(
                &dialogue,
                &format!("cli:{name}"),
                stdin.lock(),
                stdout.lock(),
            )
            .context("Chat session failed")?;
        }
        Commands::Ask { question } => {
            let faq = FaqMatcher::builtin().context("Failed to compile FAQ patterns")?;
            println!("{}", faq.respond(&question.join(" ")));
        }
        Commands::Alarms => {
            let table = KnowledgeTable::builtin().context("Failed to build knowledge table")?;
            let mut stdout = io::stdout();
            write!(stdout, "{}", format_table(&table)).context("Failed to write table")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

/// Render the knowledge table as plain text.
pub(crate) fn format_table(table: &KnowledgeTable) -> String {
    let mut out = String::new();

    let devices: Vec<&str> = table.devices().iter().map(|d| d.label.as_str()).collect();
    out.push_str(&format!("Devices: {}\n\n", devices.join(", ")));

    for category in table.categories() {
        out.push_str(&format!("{}\n", category.label));
        for entry in category.entries() {
            let summary = entry.text.lines().next().unwrap_or_default();
            out.push_str(&format!(
                "  {:<28}  {}\n",
                entry.alarm,
                truncate(summary, 48)
            ));
        }
        out.push('\n');
    }

    out.push_str("Coverage:\n");
    for device in table.devices() {
        let covered: Vec<&str> = table
            .categories()
            .iter()
            .filter(|c| table.is_covered(&device.key, &c.key))
            .map(|c| c.label.as_str())
            .collect();
        let covered = if covered.is_empty() {
            "-".to_string()
        } else {
            covered.join(", ")
        };
        out.push_str(&format!("  {:<12}  {}\n", device.label, covered));
    }

    out
}
