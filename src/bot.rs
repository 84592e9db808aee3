//! Long-polling update loop.
//!
//! Fetches message updates from Telegram and hands each text message to the
//! orchestrator on its own task. Messages from different chats are handled
//! concurrently; links inside one message stay sequential.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn, Instrument};

use crate::adapters::telegram::{Message, TelegramClient, TelegramReply};
use crate::core::Orchestrator;

/// Delay before polling again after a failed getUpdates call
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Drives the bot until interrupted
pub struct BotRunner {
    client: Arc<TelegramClient>,
    orchestrator: Arc<Orchestrator>,
    poll_timeout_seconds: u64,
}

impl BotRunner {
    pub fn new(
        client: Arc<TelegramClient>,
        orchestrator: Arc<Orchestrator>,
        poll_timeout_seconds: u64,
    ) -> Self {
        Self {
            client,
            orchestrator,
            poll_timeout_seconds,
        }
    }

    /// Poll until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        info!("Bot started");
        let mut offset: Option<i64> = None;

        loop {
            let updates = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    return Ok(());
                }
                updates = self.client.get_updates(offset, self.poll_timeout_seconds) => updates,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.dispatch(message);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %format!("{:#}", e), "Failed to fetch updates");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Spawn a handler task for one message
    fn dispatch(&self, message: Message) {
        let Some(text) = accepted_text(&message) else {
            return;
        };
        let text = text.to_string();

        let reply = TelegramReply::new(
            Arc::clone(&self.client),
            message.chat.id,
            message.message_id,
        );
        let orchestrator = Arc::clone(&self.orchestrator);
        let span = tracing::info_span!("message", chat_id = message.chat.id, message_id = message.message_id);

        tokio::spawn(
            async move {
                let outcomes = orchestrator.handle_message(&text, &reply).await;
                debug!(links = outcomes.len(), "Message handled");
            }
            .instrument(span),
        );
    }
}

/// Text of a plain, non-command message
fn accepted_text(message: &Message) -> Option<&str> {
    message
        .text
        .as_deref()
        .filter(|text| !text.trim().is_empty() && !text.starts_with('/'))
}
