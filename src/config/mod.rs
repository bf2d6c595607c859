#[cfg(feature = "cli")]
pub mod cli;
pub mod layout;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::BotConfig;
pub use layout::CollageLayout;
pub use toml_config::TomlConfig;
