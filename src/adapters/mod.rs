// Adapters layer: concrete implementations for external systems (chat platform).

pub mod telegram;

pub use telegram::{TelegramChat, TelegramClient};
