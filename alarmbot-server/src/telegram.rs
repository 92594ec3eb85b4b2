//! Telegram front-end.
//!
//! Routes `/start`, `/help` and `/ask` to [`commands`] and every other text
//! message through the dialogue. Updates arrive either by long polling or,
//! in webhook mode, through [`Webhook`] fed by the HTTP server.

mod commands;
mod handlers;
mod keyboard;

use std::ops::ControlFlow;
use std::sync::Arc;

use alarmbot_core::{Dialogue, FaqMatcher};
use anyhow::Context;
use teloxide::dispatching::UpdateHandler;
use teloxide::payloads::SetWebhookSetters;
use teloxide::prelude::*;
use teloxide::RequestError;
use teloxide::types::Me;
use teloxide::utils::command::BotCommands;
use url::Url;

pub use commands::Command;

/// Session key for a Telegram chat.
pub fn session_key(chat_id: i64) -> String {
    format!("tg:{}", chat_id)
}

/// Build the update routing tree shared by polling and webhook delivery.
pub fn schema() -> UpdateHandler<RequestError> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(commands::handle_command),
            )
            .branch(dptree::entry().endpoint(handlers::handle_message)),
    )
}

/// Fetch the bot identity and register slash commands for autocomplete.
///
/// Command registration failure is logged, not fatal.
pub async fn prepare(bot: &Bot) -> anyhow::Result<Me> {
    let me = bot.get_me().await.context("Failed to fetch bot identity")?;
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }
    Ok(me)
}

/// Long-poll Telegram until Ctrl-C.
pub async fn run_polling(bot: Bot, me: Me, dialogue: Arc<Dialogue>, faq: Arc<FaqMatcher>) {
    // A webhook left over from an earlier run would block getUpdates.
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("Failed to delete webhook before polling: {}", e);
    }

    tracing::info!("Telegram dispatcher ready, polling for updates as @{}", me.username());

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![me, dialogue, faq])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Telegram dispatcher stopped");
}

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Whether a webhook request carries the expected secret.
///
/// Without a configured secret every request is accepted.
pub fn secret_matches(expected: Option<&str>, presented: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(secret) => presented == Some(secret),
    }
}

/// Push-delivery endpoint state: dispatches updates received over HTTP.
pub struct Webhook {
    bot: Bot,
    me: Me,
    dialogue: Arc<Dialogue>,
    faq: Arc<FaqMatcher>,
    secret: Option<String>,
    handler: UpdateHandler<RequestError>,
}

impl Webhook {
    /// Dispatch state for updates pushed to an already registered webhook.
    pub fn new(
        bot: Bot,
        me: Me,
        dialogue: Arc<Dialogue>,
        faq: Arc<FaqMatcher>,
        secret: Option<String>,
    ) -> Self {
        Self {
            bot,
            me,
            dialogue,
            faq,
            secret,
            handler: schema(),
        }
    }

    /// Register `url` with Telegram and build the dispatch state.
    pub async fn register(
        bot: Bot,
        me: Me,
        dialogue: Arc<Dialogue>,
        faq: Arc<FaqMatcher>,
        url: &str,
        secret: Option<String>,
    ) -> anyhow::Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid webhook URL '{}'", url))?;
        let mut request = bot.set_webhook(url.clone());
        if let Some(ref secret) = secret {
            request = request.secret_token(secret.clone());
        }
        request.await.context("Failed to register webhook")?;
        tracing::info!("Telegram webhook registered at {}", url);

        Ok(Self::new(bot, me, dialogue, faq, secret))
    }

    /// Whether a request presenting `header` may be dispatched.
    pub fn authorize(&self, header: Option<&str>) -> bool {
        secret_matches(self.secret.as_deref(), header)
    }

    /// Run one pushed update through the routing tree.
    pub async fn dispatch(&self, update: Update) {
        let update_id = update.id;
        let deps = dptree::deps![
            self.bot.clone(),
            update,
            self.me.clone(),
            Arc::clone(&self.dialogue),
            Arc::clone(&self.faq)
        ];
        match self.handler.dispatch(deps).await {
            ControlFlow::Break(Ok(())) => {}
            ControlFlow::Break(Err(e)) => {
                tracing::warn!("Failed to handle update {:?}: {}", update_id, e);
            }
            ControlFlow::Continue(_) => {
                tracing::debug!("Ignored update {:?}", update_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key() {
        assert_eq!(session_key(123456789), "tg:123456789");
        assert_eq!(session_key(-100200300), "tg:-100200300");
    }

    #[test]
    fn test_secret_matches_without_secret() {
        assert!(secret_matches(None, None));
        assert!(secret_matches(None, Some("anything")));
    }

    #[test]
    fn test_secret_matches_with_secret() {
        assert!(secret_matches(Some("s3cret"), Some("s3cret")));
        assert!(!secret_matches(Some("s3cret"), Some("wrong")));
        assert!(!secret_matches(Some("s3cret"), None));
    }
}
