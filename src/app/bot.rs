use crate::adapters::telegram::{Message, TelegramChat, TelegramClient};
use crate::core::orchestrator::RequestOrchestrator;
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const GREETING: &str =
    "Hi! Send me a photo and I will reply with a \"now / in 15 years\" collage.";

const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

/// What the bot does with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Photo(String),
    Ignore,
}

pub fn route(message: &Message) -> Command {
    if let Some(sizes) = message.photo.as_ref().filter(|s| !s.is_empty()) {
        if let Some(largest) = sizes.last() {
            return Command::Photo(largest.file_id.clone());
        }
    }
    match message.text.as_deref().map(str::trim) {
        // "/start@SomeBot" in group chats
        Some(text) if text == "/start" || text.starts_with("/start ") || text.starts_with("/start@") => {
            Command::Start
        }
        _ => Command::Ignore,
    }
}

/// Long-polling loop feeding photos into the orchestrator.
pub struct Bot {
    telegram: Arc<TelegramClient>,
    orchestrator: RequestOrchestrator,
    poll_timeout: Duration,
    shutdown_grace: Duration,
}

impl Bot {
    pub fn new(
        telegram: Arc<TelegramClient>,
        orchestrator: RequestOrchestrator,
        poll_timeout: Duration,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            telegram,
            orchestrator,
            poll_timeout,
            shutdown_grace,
        }
    }

    /// Polls until `shutdown` resolves, then drains in-flight requests.
    pub async fn run<F>(&self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("🚀 Bot started");
        tokio::pin!(shutdown);
        let mut offset = 0i64;

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => break,
                polled = self.telegram.get_updates(offset, self.poll_timeout.as_secs()) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            if let Err(e) = self.handle_message(&message).await {
                                tracing::error!(
                                    "❌ Could not handle message {} in chat {}: {}",
                                    message.message_id,
                                    message.chat.id,
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Polling failed: {}, retrying in {:?}", e, POLL_ERROR_PAUSE);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                    }
                }
            }
        }

        self.orchestrator.shutdown(self.shutdown_grace).await;
        let total = self.orchestrator.total_generated();
        tracing::info!("👋 Bot stopped, total collages generated: {}", total);
        Ok(total)
    }

    pub async fn handle_message(&self, message: &Message) -> Result<()> {
        match route(message) {
            Command::Start => {
                self.telegram
                    .send_message(message.chat.id, GREETING, None)
                    .await?;
            }
            Command::Photo(_) => {
                let sizes = message.photo.as_deref().unwrap_or_default();
                let photo = self.telegram.download_photo(sizes).await?;
                let chat = Arc::new(TelegramChat::new(
                    Arc::clone(&self.telegram),
                    message.chat.id,
                    Some(message.message_id),
                ));
                self.orchestrator
                    .handle_incoming_photo(photo, chat.clone(), chat)
                    .await?;
            }
            Command::Ignore => {
                tracing::debug!("Ignoring message {}", message.message_id);
            }
        }
        Ok(())
    }
}
