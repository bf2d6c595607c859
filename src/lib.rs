pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::BotConfig;

pub use adapters::{TelegramChat, TelegramClient};
pub use app::Bot;
pub use config::{CollageLayout, TomlConfig};
pub use core::{
    aging::AgingClient, collage::CollageComposer, orchestrator::RequestOrchestrator,
};
pub use domain::model::PhotoBytes;
pub use utils::error::{BotError, Result};
