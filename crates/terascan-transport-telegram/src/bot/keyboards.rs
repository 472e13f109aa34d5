//! Telegram markup for the workflow keyboards

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};
use terascan_core::frontend::{InlineButton, Keyboard};

fn reply_keyboard(labels: &[&str]) -> KeyboardMarkup {
    let row = labels.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>();
    KeyboardMarkup::new(vec![row]).resize_keyboard()
}

/// Inline markup with one callback button per workflow button
#[must_use]
pub fn inline_markup(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| {
                InlineKeyboardButton::callback(button.label.clone(), button.action.callback_data())
            })
            .collect::<Vec<_>>()
    }))
}

/// Markup to attach to an outbound message; `None` leaves the keyboard as is.
///
/// # Examples
///
/// ```
/// use teloxide::types::ReplyMarkup;
/// use terascan_core::frontend::Keyboard;
/// use terascan_transport_telegram::bot::keyboards::reply_markup;
///
/// assert!(matches!(reply_markup(&Keyboard::Hide), Some(ReplyMarkup::KeyboardRemove(_))));
/// assert!(reply_markup(&Keyboard::None).is_none());
/// ```
#[must_use]
pub fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Home | Keyboard::ScanConfirm => {
            let labels = keyboard.reply_labels().unwrap_or_default();
            let mut markup = reply_keyboard(labels);
            if *keyboard == Keyboard::ScanConfirm {
                markup = markup.one_time_keyboard();
            }
            Some(ReplyMarkup::Keyboard(markup))
        }
        Keyboard::Hide => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::Inline(rows) => Some(ReplyMarkup::InlineKeyboard(inline_markup(rows))),
        Keyboard::None => None,
    }
}
