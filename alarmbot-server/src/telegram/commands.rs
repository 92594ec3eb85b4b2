//! Telegram bot slash-command handlers.
//!
//! `/start` restarts the dialogue for the chat, `/help` lists commands and
//! `/ask` answers free text through the FAQ matcher without touching the
//! chat's dialogue session.

use std::sync::Arc;

use alarmbot_core::{Dialogue, FaqMatcher};
use teloxide::prelude::*;
use teloxide::types::Message as TgMessage;
use teloxide::utils::command::BotCommands;

use super::keyboard::send_reply;
use super::session_key;

/// Reply to `/ask` without a question.
pub(super) const ASK_USAGE: &str = "Usage: /ask <question>, e.g. /ask resolve APR alarm";

/// All slash commands supported by the bot.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    /// Restart the troubleshooting flow.
    #[command(description = "Start troubleshooting an alarm")]
    Start,
    /// Show available commands.
    #[command(description = "Show available commands")]
    Help,
    /// Answer a free-text question from the FAQ.
    #[command(description = "Ask a free-text question")]
    Ask(String),
}

/// Entry-point handler for all slash commands.
pub async fn handle_command(
    bot: Bot,
    msg: TgMessage,
    cmd: Command,
    dialogue: Arc<Dialogue>,
    faq: Arc<FaqMatcher>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            let reply = dialogue.restart(&session_key(msg.chat.id.0));
            send_reply(&bot, msg.chat.id, &reply).await
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
        Command::Ask(question) => {
            bot.send_message(msg.chat.id, ask_reply(&faq, &question))
                .await?;
            Ok(())
        }
    }
}

/// Answer for `/ask <question>`.
pub(super) fn ask_reply<'a>(faq: &'a FaqMatcher, question: &str) -> &'a str {
    if question.trim().is_empty() {
        ASK_USAGE
    } else {
        faq.respond(question)
    }
}
