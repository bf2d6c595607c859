use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Cannot decode image: {message}")]
    DecodeError { message: String },

    #[error("Cannot load template '{path}': {message}")]
    TemplateLoadError { path: String, message: String },

    #[error("Image generation failed: {message}")]
    GenerationError {
        message: String,
        status: Option<u16>,
        transient: bool,
    },

    #[error("Collage composition failed: {message}")]
    ComposeError { message: String },

    #[error("Telegram API error in {method}: {message}")]
    TelegramError { method: String, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Template,
    Generation,
    Compose,
    Transport,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn generation(message: impl Into<String>) -> Self {
        BotError::GenerationError {
            message: message.into(),
            status: None,
            transient: false,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        BotError::DecodeError {
            message: message.into(),
        }
    }

    pub fn compose(message: impl Into<String>) -> Self {
        BotError::ComposeError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::DecodeError { .. } => ErrorCategory::Input,
            BotError::TemplateLoadError { .. } => ErrorCategory::Template,
            BotError::GenerationError { .. } => ErrorCategory::Generation,
            BotError::ComposeError { .. } => ErrorCategory::Compose,
            BotError::TelegramError { .. } | BotError::HttpError(_) => ErrorCategory::Transport,
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BotError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Generation | ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Template | ErrorCategory::Compose => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether a second attempt of the same call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::GenerationError { transient, .. } => *transient,
            BotError::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Short text that is safe to show to the person who sent the photo.
    pub fn user_friendly_message(&self) -> String {
        match self {
            BotError::DecodeError { .. } => {
                "the photo could not be read, please send a JPEG or PNG".to_string()
            }
            BotError::TemplateLoadError { .. } => {
                "the collage template is unavailable right now".to_string()
            }
            BotError::GenerationError { message, .. } => {
                format!("the image service did not return a picture ({message})")
            }
            BotError::ComposeError { .. } => "the collage could not be assembled".to_string(),
            BotError::TelegramError { .. } | BotError::HttpError(_) => {
                "a network problem occurred".to_string()
            }
            BotError::ConfigError { message } => format!("configuration problem: {message}"),
            BotError::MissingConfigError { field } => format!("{field} is not set"),
            BotError::InvalidConfigValueError { field, reason, .. } => {
                format!("{field} is invalid: {reason}")
            }
            BotError::IoError(e) => format!("file system error: {e}"),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Send another photo in a common format",
            ErrorCategory::Template => "Check that TEMPLATE_PATH points to a readable PNG",
            ErrorCategory::Generation => "Check the OpenAI key and quota, then try again",
            ErrorCategory::Compose => "Check the template size against the collage layout",
            ErrorCategory::Transport => "Check network connectivity and the bot token",
            ErrorCategory::Configuration => {
                "Set OPENAI_API_KEY and TELEGRAM_BOT_KEY, see --help for all options"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
