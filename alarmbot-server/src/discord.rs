//! Discord front-end.
//!
//! The guided troubleshooting flow is not offered on Discord: every message
//! gets [`STUB_REPLY`], or an FAQ answer when `discord.faq` is enabled.

use std::sync::Arc;

use alarmbot_core::FaqMatcher;
use alarmbot_core::text::truncate;
use anyhow::Context as _;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;

/// Reply sent when FAQ answers are disabled.
pub const STUB_REPLY: &str = "Alarm troubleshooting is not supported here yet. Please use the web chat or the Telegram bot.";

/// Reply for a Discord message, or `None` for messages without text
/// (attachments, embeds).
pub fn reply_for<'a>(faq: Option<&'a FaqMatcher>, content: &str) -> Option<&'a str> {
    if content.trim().is_empty() {
        return None;
    }
    Some(match faq {
        Some(faq) => faq.respond(content),
        None => STUB_REPLY,
    })
}

struct Handler {
    faq: Option<Arc<FaqMatcher>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        tracing::debug!(
            channel = %msg.channel_id,
            content = %truncate(&msg.content, 40),
            "discord message"
        );

        let Some(reply) = reply_for(self.faq.as_deref(), &msg.content) else {
            return;
        };
        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            tracing::warn!("Failed to send Discord reply to {}: {}", msg.channel_id, e);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            "Discord connected as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
    }
}

/// Connect to the Discord gateway and serve messages until the client stops.
pub async fn run(token: String, faq: Option<Arc<FaqMatcher>>) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler { faq })
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client stopped")
}
