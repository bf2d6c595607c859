//! Minimal Telegram Bot API transport: long polling, text/status messages,
//! photo download and photo upload.

use crate::domain::model::{PhotoBytes, StatusHandle};
use crate::domain::ports::{ReplySink, StatusSink};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    pub file_path: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// `poll_timeout` is the long-polling window; the HTTP timeout leaves room on top of it.
    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn read_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.ok {
            return Err(BotError::TelegramError {
                method: method.to_string(),
                message: envelope
                    .description
                    .unwrap_or_else(|| "request was not ok".to_string()),
            });
        }
        envelope.result.ok_or_else(|| BotError::TelegramError {
            method: method.to_string(),
            message: "response has no result".to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        tracing::debug!("Telegram call: {}", method);
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        Self::read_envelope(method, response).await
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(message_id) = reply_to {
            body["reply_parameters"] = json!({ "message_id": message_id });
        }
        self.call("sendMessage", body).await
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        // result is the edited Message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        png: Vec<u8>,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let part = Part::bytes(png)
            .file_name("collage.png")
            .mime_str("image/png")?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);
        if let Some(message_id) = reply_to {
            form = form.text(
                "reply_parameters",
                json!({ "message_id": message_id }).to_string(),
            );
        }

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        Self::read_envelope("sendPhoto", response).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }

    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BotError::TelegramError {
                method: "downloadFile".to_string(),
                message: format!("HTTP {}", response.status().as_u16()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Downloads the largest size of a photo (Telegram lists sizes ascending).
    pub async fn download_photo(&self, sizes: &[PhotoSize]) -> Result<PhotoBytes> {
        let largest = sizes.last().ok_or_else(|| BotError::TelegramError {
            method: "getFile".to_string(),
            message: "message has no photo sizes".to_string(),
        })?;
        tracing::debug!(
            "Downloading photo {}x{} ({:?} bytes)",
            largest.width,
            largest.height,
            largest.file_size
        );
        let file = self.get_file(&largest.file_id).await?;
        let file_path = file.file_path.ok_or_else(|| BotError::TelegramError {
            method: "getFile".to_string(),
            message: format!("file {} has no download path", file.file_id),
        })?;
        Ok(PhotoBytes::from(self.download_file(&file_path).await?))
    }
}

/// Status and reply sinks bound to one chat, answering one inbound message.
#[derive(Clone)]
pub struct TelegramChat {
    client: Arc<TelegramClient>,
    chat_id: i64,
    reply_to: Option<i64>,
}

impl TelegramChat {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64, reply_to: Option<i64>) -> Self {
        Self {
            client,
            chat_id,
            reply_to,
        }
    }
}

#[async_trait]
impl StatusSink for TelegramChat {
    async fn send(&self, text: &str) -> Result<StatusHandle> {
        let message = self
            .client
            .send_message(self.chat_id, text, self.reply_to)
            .await?;
        Ok(StatusHandle {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit(&self, handle: &StatusHandle, text: &str) -> Result<()> {
        self.client
            .edit_message_text(handle.chat_id, handle.message_id, text)
            .await
    }
}

#[async_trait]
impl ReplySink for TelegramChat {
    async fn send_image(&self, png: Vec<u8>) -> Result<()> {
        self.client
            .send_photo(self.chat_id, png, self.reply_to)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.base_url(), "TEST", Duration::from_secs(1)).unwrap()
    }

    fn message_json(message_id: i64) -> serde_json::Value {
        json!({ "message_id": message_id, "chat": { "id": 42, "type": "private" }, "date": 0 })
    }

    #[tokio::test]
    async fn test_get_updates_parses_photo_messages() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/botTEST/getUpdates")
                .json_body_partial(r#"{ "offset": 5 }"#);
            then.status(200).json_body(json!({
                "ok": true,
                "result": [{
                    "update_id": 5,
                    "message": {
                        "message_id": 9,
                        "date": 0,
                        "chat": { "id": 42, "type": "private" },
                        "photo": [
                            { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90 },
                            { "file_id": "big", "file_unique_id": "b", "width": 1280, "height": 1280, "file_size": 1000 }
                        ]
                    }
                }]
            }));
        });

        let updates = client(&server).get_updates(5, 0).await.unwrap();

        api_mock.assert();
        assert_eq!(updates.len(), 1);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.photo.as_ref().unwrap()[1].file_id, "big");
    }

    #[tokio::test]
    async fn test_not_ok_envelope_is_telegram_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/botTEST/sendMessage");
            then.status(400)
                .json_body(json!({ "ok": false, "error_code": 400, "description": "Bad Request: chat not found" }));
        });

        let err = client(&server)
            .send_message(1, "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::TelegramError { .. }));
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_download_photo_picks_largest_size() {
        let server = MockServer::start();
        let get_file = server.mock(|when, then| {
            when.method(POST)
                .path("/botTEST/getFile")
                .json_body(json!({ "file_id": "big" }));
            then.status(200).json_body(json!({
                "ok": true,
                "result": { "file_id": "big", "file_unique_id": "b", "file_path": "photos/file_1.jpg" }
            }));
        });
        let download = server.mock(|when, then| {
            when.method(GET).path("/file/botTEST/photos/file_1.jpg");
            then.status(200).body("jpeg-bytes");
        });

        let sizes = vec![
            PhotoSize {
                file_id: "small".to_string(),
                width: 90,
                height: 90,
                file_size: None,
            },
            PhotoSize {
                file_id: "big".to_string(),
                width: 1280,
                height: 1280,
                file_size: Some(10),
            },
        ];
        let photo = client(&server).download_photo(&sizes).await.unwrap();

        get_file.assert();
        download.assert();
        assert_eq!(&*photo, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_chat_sinks_send_edit_and_reply() {
        let server = MockServer::start();
        let send = server.mock(|when, then| {
            when.method(POST)
                .path("/botTEST/sendMessage")
                .json_body_partial(r#"{ "chat_id": 42, "reply_parameters": { "message_id": 9 } }"#);
            then.status(200)
                .json_body(json!({ "ok": true, "result": message_json(100) }));
        });
        let edit = server.mock(|when, then| {
            when.method(POST)
                .path("/botTEST/editMessageText")
                .json_body_partial(r#"{ "chat_id": 42, "message_id": 100, "text": "done" }"#);
            then.status(200)
                .json_body(json!({ "ok": true, "result": message_json(100) }));
        });
        let photo = server.mock(|when, then| {
            when.method(POST)
                .path("/botTEST/sendPhoto")
                .body_contains("collage.png");
            then.status(200)
                .json_body(json!({ "ok": true, "result": message_json(101) }));
        });

        let chat = TelegramChat::new(Arc::new(client(&server)), 42, Some(9));
        let handle = chat.send("working").await.unwrap();
        assert_eq!(
            handle,
            StatusHandle {
                chat_id: 42,
                message_id: 100
            }
        );
        chat.edit(&handle, "done").await.unwrap();
        chat.send_image(b"png".to_vec()).await.unwrap();

        send.assert();
        edit.assert();
        photo.assert();
    }
}
