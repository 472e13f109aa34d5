//! Operator-facing texts
//!
//! All messages the scan workflow shows to the operator, behind a trait so a
//! transport can swap the wording.

use crate::scan::{ScanMode, ScanPlan};

/// Label of the "previous page" button
pub const PREV_LABEL: &str = "◀️ Prev";
/// Label of the "next page" button
pub const NEXT_LABEL: &str = "Next ▶️";

/// Text rendering for the scan workflow
pub trait ScanView {
    /// Idle menu greeting
    fn bot_ready() -> &'static str;

    /// Shown while the chat list is fetched
    fn fetching_chats() -> &'static str;

    /// The automation account has no dialogs
    fn no_chats() -> &'static str;

    /// Header of a pagination page
    fn select_chat() -> &'static str;

    /// Replaces the pagination page once a chat is picked
    fn chat_selected_ack() -> &'static str;

    /// Scan/cancel prompt for the selected chat
    fn selected(name: &str) -> String;

    /// SCAN without a selection
    fn no_chat_selected() -> &'static str;

    /// Chat resolution failed
    fn chat_unreachable(error: &str) -> String;

    /// Chat listing failed
    fn list_failed(error: &str) -> String;

    /// History iteration failed
    fn scan_failed(error: &str) -> String;

    /// Progress line while a scan runs
    fn scanning(name: &str, plan: ScanPlan, unread_count: u32) -> String;

    /// Scan finished without matches
    fn no_links(plan: ScanPlan) -> String;

    /// Final, permanent scan summary
    fn summary(name: &str, link_count: usize, scanned: usize) -> String;

    /// CANCEL acknowledgement
    fn cancelled() -> &'static str;

    /// Unrecognized text
    fn unknown_action() -> &'static str;

    /// Label of a chat row
    fn chat_label(name: &str, unread_count: u32) -> String;
}

/// Default English implementation of `ScanView`
pub struct DefaultScanView;

impl ScanView for DefaultScanView {
    fn bot_ready() -> &'static str {
        "✅ Bot Ready."
    }

    fn fetching_chats() -> &'static str {
        "⏳ Fetching chats..."
    }

    fn no_chats() -> &'static str {
        "❌ No chats found."
    }

    fn select_chat() -> &'static str {
        "📍 Select chat:"
    }

    fn chat_selected_ack() -> &'static str {
        "✅ Chat Selected\nNow press SCAN"
    }

    fn selected(name: &str) -> String {
        format!("Selected: {name}\nPress SCAN to start scanning.")
    }

    fn no_chat_selected() -> &'static str {
        "❌ No chat selected. Use LIST first."
    }

    fn chat_unreachable(error: &str) -> String {
        format!("❌ Could not access chat: {error}")
    }

    fn list_failed(error: &str) -> String {
        format!("❌ Could not fetch chats: {error}")
    }

    fn scan_failed(error: &str) -> String {
        format!("❌ Scan failed: {error}")
    }

    fn scanning(name: &str, plan: ScanPlan, unread_count: u32) -> String {
        let mut status = format!("🔍 Scanning last {} message(s) of: {name}", plan.limit);
        if plan.mode == ScanMode::Unread {
            status.push_str(&format!(" ({unread_count} unread)"));
        }
        status
    }

    fn no_links(plan: ScanPlan) -> String {
        match plan.mode {
            ScanMode::Unread => {
                "❌ No matching Terabox links found. (in unread messages)".to_string()
            }
            ScanMode::Bounded => format!(
                "❌ No matching Terabox links found. (in last {} messages)",
                plan.limit
            ),
        }
    }

    fn summary(name: &str, link_count: usize, scanned: usize) -> String {
        format!(
            "✅ Processed {name}\n🔗 Found {link_count} Terabox link(s)\n📨 Scanned {scanned} message(s)"
        )
    }

    fn cancelled() -> &'static str {
        "Cancelled. Back to home."
    }

    fn unknown_action() -> &'static str {
        "Unknown action. Use START or LIST."
    }

    fn chat_label(name: &str, unread_count: u32) -> String {
        if unread_count > 0 {
            format!("{name} ({unread_count} unread)")
        } else {
            name.to_string()
        }
    }
}
