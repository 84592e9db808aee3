//! Telegram Bot API adapter.
//!
//! Long-polls for incoming messages and replies in the originating chat:
//! status messages that are edited in place, and video uploads streamed
//! from the staging file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::core::StagedArtifact;

use super::{ChatReply, DeliverySink, StatusHandle};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Extra time allowed on top of the long-poll timeout
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram Bot API client
pub struct TelegramClient {
    /// Bot token
    bot_token: String,
    /// API base address
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Response from Telegram API
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Message result from sendMessage/sendVideo
#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// An incoming update from getUpdates
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot's own account, from getMe
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Configuration for Telegram client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

fn default_poll_timeout() -> u64 {
    30
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, DEFAULT_API_BASE)
    }

    /// Create a client against a non-default API server
    pub fn with_api_base(bot_token: String, api_base: impl Into<String>) -> Self {
        Self {
            bot_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from config
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self::new(config.bot_token.clone())
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Unwrap the API envelope
    fn unwrap_response<T>(method: &str, response: TelegramResponse<T>) -> Result<T> {
        if !response.ok {
            anyhow::bail!(
                "Telegram API error in {}: {}",
                method,
                response.description.unwrap_or_default()
            );
        }

        response
            .result
            .with_context(|| format!("Telegram API returned no result for {}", method))
    }

    /// Call a JSON method
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.client.post(self.api_url(method)).json(&payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response: TelegramResponse<T> = request
            .send()
            .await
            .with_context(|| format!("Failed to call Telegram {}", method))?
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        Self::unwrap_response(method, response)
    }

    /// Fetch the bot's own account
    pub async fn get_me(&self) -> Result<BotUser> {
        self.call("getMe", serde_json::json!({}), Some(POLL_GRACE))
            .await
    }

    /// Long-poll for new message updates
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut payload = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            payload["offset"] = serde_json::json!(offset);
        }

        let timeout = Duration::from_secs(timeout_secs) + POLL_GRACE;
        self.call("getUpdates", payload, Some(timeout)).await
    }

    /// Send a text message, optionally as a reply
    pub async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<i64> {
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(message_id) = reply_to {
            payload["reply_parameters"] = serde_json::json!({ "message_id": message_id });
        }

        let result: MessageResult = self.call("sendMessage", payload, None).await?;
        Ok(result.message_id)
    }

    /// Replace the text of a message
    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "text": text,
                }),
                None,
            )
            .await?;
        Ok(())
    }

    /// Delete a message
    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                serde_json::json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                }),
                None,
            )
            .await?;
        Ok(())
    }

    /// Upload a video file, streaming it from disk
    pub async fn send_video(
        &self,
        chat_id: i64,
        video_path: &Path,
        file_name: &str,
        reply_to: Option<i64>,
    ) -> Result<i64> {
        let url = self.api_url("sendVideo");

        let file = tokio::fs::File::open(video_path)
            .await
            .with_context(|| format!("Failed to open video file: {}", video_path.display()))?;
        let length = file
            .metadata()
            .await
            .context("Failed to read video file metadata")?
            .len();

        let extension = video_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let video_part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(file_name.to_string())
            .mime_str(video_mime(extension))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("supports_streaming", "true")
            .part("video", video_part);

        if let Some(message_id) = reply_to {
            form = form.text(
                "reply_parameters",
                serde_json::json!({ "message_id": message_id }).to_string(),
            );
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send Telegram video")?;

        let result: TelegramResponse<MessageResult> = response
            .json()
            .await
            .context("Failed to parse Telegram response")?;

        let message = Self::unwrap_response("sendVideo", result)?;
        info!(chat_id, message_id = message.message_id, bytes = length, "Video sent");
        Ok(message.message_id)
    }
}

/// MIME type for a staged container extension
fn video_mime(extension: &str) -> &'static str {
    match extension {
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "video/mp4",
    }
}

/// Replies to one incoming message
#[derive(Clone)]
pub struct TelegramReply {
    client: Arc<TelegramClient>,
    chat_id: i64,
    message_id: i64,
}

impl TelegramReply {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64, message_id: i64) -> Self {
        Self {
            client,
            chat_id,
            message_id,
        }
    }
}

#[async_trait]
impl DeliverySink for TelegramReply {
    async fn deliver(&self, artifact: &StagedArtifact) -> Result<()> {
        debug!(chat_id = self.chat_id, path = %artifact.path().display(), "Uploading video");
        self.client
            .send_video(
                self.chat_id,
                artifact.path(),
                &artifact.file_name(),
                Some(self.message_id),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatReply for TelegramReply {
    async fn post_status(&self, text: &str) -> Result<StatusHandle> {
        let id = self
            .client
            .send_message(self.chat_id, text, Some(self.message_id))
            .await?;
        Ok(StatusHandle(id))
    }

    async fn edit_status(&self, status: StatusHandle, text: &str) -> Result<()> {
        self.client
            .edit_message_text(self.chat_id, status.0, text)
            .await
    }

    async fn delete_status(&self, status: StatusHandle) -> Result<()> {
        self.client.delete_message(self.chat_id, status.0).await
    }
}
