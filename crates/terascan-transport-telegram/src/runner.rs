use crate::bot;
use crate::bot::handlers::{get_user_id_safe, get_user_name, Command};
use crate::bot::{TelegramFrontEnd, UnauthorizedCache};
use crate::config::{
    get_unauthorized_cache_max_size, get_unauthorized_cache_ttl, get_unauthorized_cooldown,
    BotSettings,
};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use terascan_core::frontend::FrontEnd;
use terascan_core::history::HistoryClient;
use terascan_core::router::InteractionRouter;
use tracing::{debug, error, info};

/// Run the Telegram transport runtime until Ctrl+C.
///
/// `history` must already be connected and authorized.
pub async fn run_bot(settings: Arc<BotSettings>, history: Arc<dyn HistoryClient>) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let frontend: Arc<dyn FrontEnd> = Arc::new(TelegramFrontEnd::new(bot.clone()));
    let router = Arc::new(InteractionRouter::new(
        history,
        frontend,
        settings.scan.as_ref(),
    ));
    let unauthorized_cache = init_unauthorized_cache();
    let handler = setup_handler();

    info!(
        operators = settings.telegram.allowed_users().len(),
        "Bot is running..."
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, router, unauthorized_cache])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_unauthorized_cache() -> Arc<UnauthorizedCache> {
    let cooldown = get_unauthorized_cooldown();
    let ttl = get_unauthorized_cache_ttl();
    let max_size = get_unauthorized_cache_max_size();

    info!(
        "Initializing UnauthorizedCache (cooldown: {}s, ttl: {}s, max_size: {})",
        cooldown, ttl, max_size
    );

    Arc::new(UnauthorizedCache::new(cooldown, ttl, max_size))
}

fn is_operator(settings: &BotSettings, user_id: i64) -> bool {
    settings.telegram.allowed_users().contains(&user_id)
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .filter(|q: CallbackQuery, settings: Arc<BotSettings>| {
                    is_operator(&settings, q.from.id.0.cast_signed())
                })
                .endpoint(handle_callback),
        )
        .branch(Update::filter_callback_query().endpoint(handle_unauthorized_callback))
        .branch(
            Update::filter_message().branch(
                // Operators only
                dptree::filter(|msg: Message, settings: Arc<BotSettings>| {
                    is_operator(&settings, get_user_id_safe(&msg))
                })
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
            ),
        )
        .branch(
            // Everyone not matched above is a stranger
            Update::filter_message().endpoint(handle_unauthorized),
        )
}

async fn handle_unauthorized(
    bot: Bot,
    msg: Message,
    cache: Arc<UnauthorizedCache>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);
    let user_name = get_user_name(&msg);

    if cache.should_send(user_id, &user_name).await {
        info!(
            "⛔️ Unauthorized access from user {} ({}). Sending denial message.",
            user_id, user_name
        );

        if let Err(e) = bot.send_message(msg.chat.id, "⛔️ Access denied").await {
            error!("Failed to send access denied message to {}: {}", user_id, e);
        } else {
            cache.mark_sent(user_id).await;
        }
    }

    respond(())
}

async fn handle_unauthorized_callback(
    bot: Bot,
    q: CallbackQuery,
) -> Result<(), teloxide::RequestError> {
    debug!(user_id = q.from.id.0, "Ignoring callback from unauthorized user");
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!("Failed to answer callback query: {e}");
    }
    respond(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    router: Arc<InteractionRouter>,
    cache: Arc<UnauthorizedCache>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::command(bot, msg, cmd, router, cache).await {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    msg: Message,
    router: Arc<InteractionRouter>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_text(msg, router).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<InteractionRouter>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_callback(bot, q, router).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
