//! Startup helpers: bot token resolution and the session expiry sweeper.

use std::sync::Arc;

use alarmbot_core::{Config, SessionConfig, SessionStore};
use chrono::{DateTime, Duration, Utc};


/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the Discord bot token.
pub const DISCORD_TOKEN_VAR: &str = "DISCORD_BOT_TOKEN";

/// Resolve a token from `env_var` (if set and non-empty), else `configured`.
///
/// The token is **never** passed to any tracing macro.
///
/// # Errors
///
/// Returns an error naming both sources if neither provides a token.
pub fn resolve_token(
    env_var: &str,
    configured: Option<&str>,
    config_key: &str,
) -> anyhow::Result<String> {
    if let Ok(token) = std::env::var(env_var)
        && !token.is_empty()
    {
        return Ok(token);
    }
    configured
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("Bot token required: set {env_var} env var or {config_key} in config")
        })
}

/// Resolve the Telegram bot token (env var > `telegram.token`).
pub fn resolve_telegram_token(config: &Config) -> anyhow::Result<String> {
    let configured = config.telegram.as_ref().and_then(|t| t.token.as_deref());
    resolve_token(TELEGRAM_TOKEN_VAR, configured, "telegram.token")
}

/// Resolve the Discord bot token (env var > `discord.token`).
pub fn resolve_discord_token(config: &Config) -> anyhow::Result<String> {
    let configured = config.discord.as_ref().and_then(|d| d.token.as_deref());
    resolve_token(DISCORD_TOKEN_VAR, configured, "discord.token")
}

/// A front-end's session store, labelled for log output.
pub type NamedStore = (&'static str, Arc<dyn SessionStore>);

/// Evict sessions untouched since `now - idle_secs` from every store.
///
/// Returns the total number of evicted sessions.
pub fn sweep_idle(stores: &[NamedStore], now: DateTime<Utc>, idle_secs: u64) -> usize {
    let secs = i64::try_from(idle_secs)
        .unwrap_or(i64::MAX)
        .min(i64::MAX / 1000);
    let Some(cutoff) = now.checked_sub_signed(Duration::seconds(secs)) else {
        return 0;
    };
    stores
        .iter()
        .map(|(name, store)| {
            let evicted = store.evict_idle(cutoff);
            if evicted > 0 {
                tracing::debug!(frontend = name, evicted, "evicted idle sessions");
            }
            evicted
        })
        .sum()
}

/// Periodically evict idle sessions. Never returns.
///
/// With expiry disabled this parks forever so it can sit in a `select!`
/// beside the listeners.
pub async fn run_session_sweeper(stores: Vec<NamedStore>, config: SessionConfig) {
    if config.idle_timeout().is_none() {
        tracing::info!("Session expiry disabled");
        return std::future::pending().await;
    }

    let mut ticker = tokio::time::interval(config.sweep_interval());
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let evicted = sweep_idle(&stores, Utc::now(), config.idle_timeout_secs);
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions", evicted);
        }
    }
}
