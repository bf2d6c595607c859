use crate::config::layout::CollageLayout;
use crate::config::toml_config::TomlConfig;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, validate_secret, validate_url, Validate};
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "aging-bot")]
#[command(about = "Telegram bot that turns a photo into a now / in-15-years collage")]
pub struct BotConfig {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "TELEGRAM_BOT_KEY", hide_env_values = true)]
    pub telegram_bot_key: String,

    #[arg(long, env = "TEMPLATE_PATH", default_value = "data/template.png")]
    pub template_path: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env = "TELEGRAM_API_BASE", default_value = "https://api.telegram.org")]
    pub telegram_api_base: String,

    #[arg(long, default_value = "4")]
    pub max_concurrent_generations: usize,

    #[arg(long, default_value = "8")]
    pub compose_workers: usize,

    #[arg(long, default_value = "180")]
    pub request_timeout_secs: u64,

    #[arg(long, default_value = "0")]
    pub max_retries: u32,

    #[arg(long, default_value = "2")]
    pub retry_delay_secs: u64,

    #[arg(long, default_value = "30")]
    pub poll_timeout_secs: u64,

    #[arg(long, default_value = "30")]
    pub shutdown_grace_secs: u64,

    /// Optional TOML file with [generation] and [layout] overrides
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl BotConfig {
    /// Applies the optional TOML file and returns the collage layout to use.
    pub fn resolve(&mut self) -> Result<CollageLayout> {
        match self.config.clone() {
            Some(path) => {
                tracing::info!("📁 Loading overrides from: {}", path);
                let file = TomlConfig::from_file(&path)?;
                file.apply_to(self);
                Ok(file.layout.unwrap_or_default())
            }
            None => Ok(CollageLayout::default()),
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl ConfigProvider for BotConfig {
    fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }

    fn openai_base_url(&self) -> &str {
        &self.openai_base_url
    }

    fn template_path(&self) -> &str {
        &self.template_path
    }

    fn max_concurrent_generations(&self) -> usize {
        self.max_concurrent_generations
    }

    fn compose_workers(&self) -> usize {
        self.compose_workers
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        validate_secret("OPENAI_API_KEY", &self.openai_api_key)?;
        validate_secret("TELEGRAM_BOT_KEY", &self.telegram_bot_key)?;
        validate_path("template_path", &self.template_path)?;
        validate_url("openai_base_url", &self.openai_base_url)?;
        validate_url("telegram_api_base", &self.telegram_api_base)?;

        validate_range("max_concurrent_generations", self.max_concurrent_generations, 1, 64)?;
        validate_range("compose_workers", self.compose_workers, 1, 64)?;
        validate_range("request_timeout_secs", self.request_timeout_secs, 1, 3600)?;
        validate_range("max_retries", self.max_retries, 0, 10)?;
        validate_range("poll_timeout_secs", self.poll_timeout_secs, 0, 120)?;

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "aging-bot",
            "--openai-api-key",
            "sk-test",
            "--telegram-bot-key",
            "123:abc",
        ]
    }

    #[test]
    fn test_defaults_match_production_values() {
        let config = BotConfig::try_parse_from(base_args()).unwrap();
        assert_eq!(config.template_path, "data/template.png");
        assert_eq!(config.max_concurrent_generations, 4);
        assert_eq!(config.compose_workers, 8);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.request_timeout(), Duration::from_secs(180));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_secret_fails_validation() {
        let config = BotConfig::try_parse_from(vec![
            "aging-bot",
            "--openai-api-key",
            " ",
            "--telegram-bot-key",
            "123:abc",
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut args = base_args();
        args.extend(["--max-concurrent-generations", "0"]);
        let config = BotConfig::try_parse_from(args).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_without_file_uses_default_layout() {
        let mut config = BotConfig::try_parse_from(base_args()).unwrap();
        assert_eq!(config.resolve().unwrap(), CollageLayout::default());
    }
}
