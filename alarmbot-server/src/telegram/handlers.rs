//! Free-text message handler.

use std::sync::Arc;

use alarmbot_core::Dialogue;
use alarmbot_core::text::truncate;
use teloxide::prelude::*;
use teloxide::types::Message as TgMessage;

use super::keyboard::send_reply;
use super::session_key;

/// Route a text message through the dialogue and send the reply.
///
/// Non-text updates (stickers, photos, ...) are ignored.
pub async fn handle_message(
    bot: Bot,
    msg: TgMessage,
    dialogue: Arc<Dialogue>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    tracing::debug!(chat_id, text = %truncate(text, 40), "telegram message");

    let reply = dialogue.handle(&session_key(chat_id), text);
    send_reply(&bot, msg.chat.id, &reply).await
}
