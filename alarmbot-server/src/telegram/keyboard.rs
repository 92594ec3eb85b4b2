//! Reply-keyboard builders for dialogue choices.

use alarmbot_core::Reply;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

/// Buttons per keyboard row.
const CHOICES_PER_ROW: usize = 2;

/// Build a resized one-time reply keyboard with one button per choice.
pub(super) fn build_choice_keyboard(choices: &[String]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = choices
        .chunks(CHOICES_PER_ROW)
        .map(|row| row.iter().map(KeyboardButton::new).collect())
        .collect();
    KeyboardMarkup::new(rows)
        .resize_keyboard()
        .one_time_keyboard()
}

/// Markup for a reply: its choices as a keyboard, or keyboard removal when
/// the reply offers none.
pub(super) fn reply_markup(reply: &Reply) -> ReplyMarkup {
    if reply.choices.is_empty() {
        ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
    } else {
        ReplyMarkup::Keyboard(build_choice_keyboard(&reply.choices))
    }
}

/// Send a dialogue reply with its keyboard.
pub(super) async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<()> {
    bot.send_message(chat_id, &reply.text)
        .reply_markup(reply_markup(reply))
        .await?;
    Ok(())
}
