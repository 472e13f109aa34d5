/// `FrontEnd` implementation on top of the Bot API
pub mod frontend;
/// Command, text and callback handlers
pub mod handlers;
/// Mapping of workflow keyboards to Telegram markup
pub mod keyboards;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Unauthorized access flood protection
pub mod unauthorized_cache;

pub use frontend::TelegramFrontEnd;
pub use unauthorized_cache::UnauthorizedCache;
