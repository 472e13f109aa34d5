use dotenvy::dotenv;
use std::sync::Arc;
use terascan_core::config::ScanSettings;
use terascan_core::history::HistoryClient;
use terascan_telegram_bot::history::MtprotoHistory;
use terascan_telegram_bot::logging::{init_logging, RedactionPatterns};
use terascan_telegram_bot::settings::HistorySettings;
use terascan_transport_telegram::config::{BotSettings, TelegramSettings};
use terascan_transport_telegram::runner::run_bot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Redaction must be ready before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting Terascan bot...");

    let (settings, history_settings) = init_settings();
    let history = init_history(&history_settings).await;

    run_bot(settings, history.clone()).await;

    if let Err(e) = history.save_session(&history_settings.session_file) {
        warn!("Failed to save MTProto session: {e}");
    }
    info!("Terascan bot stopped.");
    Ok(())
}

fn init_settings() -> (Arc<BotSettings>, HistorySettings) {
    let scan_settings = match ScanSettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load scan configuration: {}", e);
            std::process::exit(1);
        }
    };
    let telegram_settings = match TelegramSettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load telegram configuration: {}", e);
            std::process::exit(1);
        }
    };
    let history_settings = match HistorySettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load history account configuration: {}", e);
            std::process::exit(1);
        }
    };

    if telegram_settings.allowed_users().is_empty() {
        warn!("ALLOWED_USERS is empty, every user will be denied");
    }

    info!("Configuration loaded successfully.");
    (
        Arc::new(BotSettings::new(scan_settings, telegram_settings)),
        history_settings,
    )
}

async fn init_history(settings: &HistorySettings) -> Arc<MtprotoHistory> {
    let history = match MtprotoHistory::connect(settings).await {
        Ok(history) => history,
        Err(e) => {
            error!("Failed to connect the history account: {}", e);
            std::process::exit(1);
        }
    };

    match history.is_authorized().await {
        Ok(true) => info!("History account authorized."),
        Ok(false) => {
            error!(
                "Session '{}' is not logged in. Authorize it once with a login tool, then restart.",
                settings.session_file
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to check history account authorization: {}", e);
            std::process::exit(1);
        }
    }

    let history = Arc::new(history);
    if let Err(e) = history.list_dialogs().await {
        warn!("Initial dialog listing failed: {e}");
    }
    history
}
