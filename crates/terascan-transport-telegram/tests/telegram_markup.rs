use teloxide::types::{InlineKeyboardButtonKind, ReplyMarkup};
use terascan_core::frontend::{ButtonAction, InlineButton, Keyboard};
use terascan_transport_telegram::bot::keyboards::reply_markup;

fn callback_data(kind: &InlineKeyboardButtonKind) -> Option<&str> {
    match kind {
        InlineKeyboardButtonKind::CallbackData(data) => Some(data),
        _ => None,
    }
}

#[test]
fn home_keyboard_is_resized_reply_keyboard() {
    let Some(ReplyMarkup::Keyboard(markup)) = reply_markup(&Keyboard::Home) else {
        panic!("home must be a reply keyboard");
    };

    let labels: Vec<&str> = markup.keyboard[0].iter().map(|b| b.text.as_str()).collect();
    assert_eq!(labels, vec!["START", "LIST"]);
    assert!(markup.resize_keyboard);
    assert!(!markup.one_time_keyboard);
}

#[test]
fn scan_keyboard_is_one_time() {
    let Some(ReplyMarkup::Keyboard(markup)) = reply_markup(&Keyboard::ScanConfirm) else {
        panic!("scan confirm must be a reply keyboard");
    };

    let labels: Vec<&str> = markup.keyboard[0].iter().map(|b| b.text.as_str()).collect();
    assert_eq!(labels, vec!["SCAN", "CANCEL"]);
    assert!(markup.one_time_keyboard);
}

#[test]
fn hide_and_none() {
    assert!(matches!(
        reply_markup(&Keyboard::Hide),
        Some(ReplyMarkup::KeyboardRemove(_))
    ));
    assert!(reply_markup(&Keyboard::None).is_none());
}

#[test]
fn inline_rows_round_trip_through_callback_data() {
    let rows = vec![
        vec![InlineButton::new("Deals (3 unread)", ButtonAction::Select(-1_001_234))],
        vec![
            InlineButton::new("◀️ Prev", ButtonAction::Prev),
            InlineButton::new("Next ▶️", ButtonAction::Next),
        ],
    ];
    let Some(ReplyMarkup::InlineKeyboard(markup)) = reply_markup(&Keyboard::Inline(rows.clone()))
    else {
        panic!("expected inline markup");
    };

    assert_eq!(markup.inline_keyboard.len(), 2);
    for (row, expected) in markup.inline_keyboard.iter().zip(&rows) {
        for (button, expected) in row.iter().zip(expected) {
            assert_eq!(button.text, expected.label);
            let data = callback_data(&button.kind).expect("callback button");
            assert_eq!(ButtonAction::parse(data), Some(expected.action));
        }
    }
}
