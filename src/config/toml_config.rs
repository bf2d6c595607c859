use crate::config::layout::CollageLayout;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional overrides file layered on top of CLI/env configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub generation: Option<GenerationOverrides>,
    pub layout: Option<CollageLayout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOverrides {
    pub openai_base_url: Option<String>,
    pub template_path: Option<String>,
    pub max_concurrent: Option<usize>,
    pub compose_workers: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let config: Self = toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${TEMPLATE_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    #[cfg(feature = "cli")]
    pub fn apply_to(&self, config: &mut crate::config::BotConfig) {
        let Some(overrides) = &self.generation else {
            return;
        };
        if let Some(url) = &overrides.openai_base_url {
            config.openai_base_url = url.clone();
        }
        if let Some(path) = &overrides.template_path {
            config.template_path = path.clone();
        }
        if let Some(n) = overrides.max_concurrent {
            config.max_concurrent_generations = n;
        }
        if let Some(n) = overrides.compose_workers {
            config.compose_workers = n;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(n) = overrides.max_retries {
            config.max_retries = n;
        }
        if let Some(secs) = overrides.retry_delay_secs {
            config.retry_delay_secs = secs;
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(overrides) = &self.generation {
            if let Some(url) = &overrides.openai_base_url {
                validate_url("generation.openai_base_url", url)?;
            }
            if let Some(n) = overrides.max_concurrent {
                validate_range("generation.max_concurrent", n, 1, 64)?;
            }
            if let Some(n) = overrides.compose_workers {
                validate_range("generation.compose_workers", n, 1, 64)?;
            }
            if let Some(secs) = overrides.request_timeout_secs {
                validate_range("generation.request_timeout_secs", secs, 1, 3600)?;
            }
        }
        if let Some(layout) = &self.layout {
            layout.validate()?;
        }
        Ok(())
    }
}
