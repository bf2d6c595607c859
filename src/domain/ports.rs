use crate::domain::model::StatusHandle;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Progress text shown to the user while a request runs.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<StatusHandle>;
    async fn edit(&self, handle: &StatusHandle, text: &str) -> Result<()>;
}

/// Receives the finished collage.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_image(&self, png: Vec<u8>) -> Result<()>;
}

/// External image-generation call producing the aged photo.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_aged(&self, photo: &[u8]) -> Result<Vec<u8>>;
}

pub trait ConfigProvider: Send + Sync {
    fn openai_api_key(&self) -> &str;
    fn openai_base_url(&self) -> &str;
    fn template_path(&self) -> &str;
    fn max_concurrent_generations(&self) -> usize;
    fn compose_workers(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn max_retries(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}
