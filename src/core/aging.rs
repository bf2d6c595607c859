use crate::core::ConfigProvider;
use crate::domain::ports::ImageGenerator;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const MODEL_NAME: &str = "gpt-image-1";
pub const OUTPUT_QUALITY: &str = "high";
pub const OUTPUT_SIZE: &str = "1024x1024";
pub const PROMPT: &str = "Make a photograph of this person 15 years from now. \
Keep the main facial features, hair colour and elements of clothing. \
The person should look successful, and the photograph should be a portrait.";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Counts calls holding a permit; decremented on drop so every exit path is covered.
struct InFlightGuard<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Client for the image-edit endpoint that produces the aged photo.
///
/// All calls share one semaphore, so at most `limit` requests are ever in
/// flight against the service regardless of how many chats are waiting.
pub struct AgingClient {
    client: Client,
    api_key: String,
    endpoint: String,
    permits: Arc<Semaphore>,
    limit: usize,
    max_retries: u32,
    retry_delay: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl AgingClient {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let limit = config.max_concurrent_generations().max(1);

        Ok(Self {
            client,
            api_key: config.openai_api_key().to_string(),
            endpoint: format!(
                "{}/images/edits",
                config.openai_base_url().trim_end_matches('/')
            ),
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            max_retries: config.max_retries(),
            retry_delay: config.retry_delay(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls seen since start.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn request_once(&self, photo: &[u8]) -> Result<Vec<u8>> {
        let part = Part::bytes(photo.to_vec())
            .file_name("input.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("model", MODEL_NAME)
            .text("prompt", PROMPT)
            .text("n", "1")
            .text("quality", OUTPUT_QUALITY)
            .text("size", OUTPUT_SIZE)
            .part("image[]", part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::GenerationError {
                message: format!("request to image service failed: {}", e),
                status: None,
                transient: e.is_timeout() || e.is_connect() || e.is_request(),
            })?;

        let status = response.status();
        tracing::debug!("Image service responded with {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(BotError::GenerationError {
                message: format!("HTTP {}: {}", status.as_u16(), detail),
                status: Some(status.as_u16()),
                transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            });
        }

        let payload: ImagesResponse = response
            .json()
            .await
            .map_err(|e| BotError::generation(format!("malformed response: {}", e)))?;
        let b64 = payload
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| BotError::generation("response contains no b64_json image"))?;
        let bytes = BASE64
            .decode(b64.trim())
            .map_err(|e| BotError::generation(format!("invalid base64 image payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(BotError::generation("image payload is empty"));
        }
        Ok(bytes)
    }
}

#[async_trait]
impl ImageGenerator for AgingClient {
    async fn generate_aged(&self, photo: &[u8]) -> Result<Vec<u8>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BotError::generation("generation limiter is closed"))?;
        let _in_flight = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);
        tracing::debug!(
            "Generation slot acquired ({}/{} in use)",
            self.in_flight(),
            self.limit
        );

        let mut attempt = 0;
        loop {
            match self.request_once(photo).await {
                Ok(bytes) => {
                    tracing::debug!("Received aged image ({} bytes)", bytes.len());
                    return Ok(bytes);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ Generation attempt {} failed: {}, retrying in {:?}",
                        attempt,
                        e,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
