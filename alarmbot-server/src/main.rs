//! Alarmbot server: web chat, Telegram bot and Discord bot in one process.
//!
//! Every front-end owns an independent session store; all of them answer from
//! the same immutable knowledge table built in `alarmbot-core`.

mod discord;
mod startup;
mod telegram;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use alarmbot_core::config::Rotation;
use alarmbot_core::{
    Config, Dialogue, FaqMatcher, KnowledgeTable, MemorySessionStore, SessionStore, TelegramMode,
};
use anyhow::Context;
use clap::Parser;
use startup::{NamedStore, resolve_discord_token, resolve_telegram_token, run_session_sweeper};
use teloxide::Bot;
use tracing_subscriber::prelude::*;

/// Alarmbot: network alarm troubleshooting assistant
#[derive(Parser)]
#[command(name = "alarmbot", version)]
struct Args {
    /// Path to a custom config file (overrides default search locations)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

/// Default tracing directives enabling info-level logs for this crate and alarmbot-core.
const DEFAULT_DIRECTIVES: &[&str] = &["alarmbot_server=info", "alarmbot_core=info"];

/// Build the default `EnvFilter`: RUST_LOG (if set) plus our default directives.
fn default_env_filter() -> anyhow::Result<tracing_subscriber::EnvFilter> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Initialize the tracing subscriber.
///
/// With a `[logging]` section, logs go to stdout and to a rolling file;
/// otherwise stdout only.
///
/// Returns the non-blocking writer guard that must be held for the process lifetime.
fn init_tracing(
    config: &Config,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(ref lc) = config.logging else {
        tracing_subscriber::fmt()
            .with_env_filter(default_env_filter()?)
            .init();
        return Ok(None);
    };

    if let Err(e) = std::fs::create_dir_all(&lc.directory) {
        eprintln!(
            "Warning: Failed to create log directory '{}': {}. Falling back to stdout-only.",
            lc.directory, e
        );
        tracing_subscriber::fmt()
            .with_env_filter(default_env_filter()?)
            .init();
        return Ok(None);
    }

    let rotation = match lc.rotation {
        Rotation::Daily => tracing_appender::rolling::Rotation::DAILY,
        Rotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
        Rotation::Never => tracing_appender::rolling::Rotation::NEVER,
    };

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix("alarmbot")
        .filename_suffix("log")
        .max_log_files(lc.max_files)
        .build(&lc.directory)
        .context("Failed to create rolling file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(default_env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Ok(Some(guard))
}

/// A dialogue over a fresh, front-end-private session store.
fn frontend_dialogue(
    table: &Arc<KnowledgeTable>,
    config: &Config,
) -> (Arc<Dialogue>, Arc<dyn SessionStore>) {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let dialogue = Dialogue::new(
        Arc::clone(table),
        Arc::clone(&store),
        config.dialogue.unsupported_category,
    );
    (Arc::new(dialogue), store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // 1. Load configuration first (tracing init depends on it).
    let config = Config::load(args.config.as_deref()).context("Failed to load config")?;

    // 2. Initialize tracing.
    let _guard = init_tracing(&config)?;

    tracing::info!("Starting Alarmbot");

    // 3. Both bot tokens are required. Tokens are never logged.
    let telegram_token = resolve_telegram_token(&config).context("Failed to obtain Telegram token")?;
    let discord_token = resolve_discord_token(&config).context("Failed to obtain Discord token")?;

    // 4. Shared read-only data.
    let table = Arc::new(KnowledgeTable::builtin().context("Failed to build knowledge table")?);
    let faq = Arc::new(FaqMatcher::builtin().context("Failed to compile FAQ patterns")?);
    tracing::info!(
        "Knowledge table loaded: {} devices, {} categories, {} covered alarms",
        table.devices().len(),
        table.categories().len(),
        table.covered_entries().count()
    );

    // 5. One dialogue and session store per front-end.
    let (web_dialogue, web_store) = frontend_dialogue(&table, &config);
    let (tg_dialogue, tg_store) = frontend_dialogue(&table, &config);

    // 6. Telegram: identity, commands, and webhook registration if configured.
    let bot = Bot::new(telegram_token);
    let me = telegram::prepare(&bot).await?;
    let tg_config = config.telegram.clone().unwrap_or_default();

    let mut state = web::AppState::new(web_dialogue);
    let polling = match tg_config.mode {
        TelegramMode::Polling => true,
        TelegramMode::Webhook => {
            let url = tg_config
                .webhook_url
                .as_deref()
                .context("telegram.webhook_url is required in webhook mode")?;
            let webhook = telegram::Webhook::register(
                bot.clone(),
                me.clone(),
                Arc::clone(&tg_dialogue),
                Arc::clone(&faq),
                url,
                tg_config.webhook_secret.clone(),
            )
            .await?;
            state = state.with_webhook(Arc::new(webhook));
            false
        }
    };

    // 7. Discord: stub replies unless FAQ answers are enabled.
    let discord_faq = config
        .discord
        .as_ref()
        .is_some_and(|d| d.faq)
        .then(|| Arc::clone(&faq));

    let stores: Vec<NamedStore> = vec![("web", web_store), ("telegram", tg_store)];
    let address = config.web.address();
    let router = web::router(state);

    // 8. Run every listener until one of them stops.
    tokio::select! {
        result = web::serve(&address, router) => {
            result?;
            tracing::info!("Web server stopped, shutting down");
        }
        _ = async {
            if polling {
                telegram::run_polling(bot, me, tg_dialogue, faq).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::info!("Telegram dispatcher stopped, shutting down");
        }
        result = discord::run(discord_token, discord_faq) => {
            result?;
            tracing::info!("Discord client stopped, shutting down");
        }
        _ = run_session_sweeper(stores, config.session.clone()) => {}
    }

    Ok(())
}
