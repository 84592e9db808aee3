//! Per-message pipeline: extract links, resolve, relay, report.
//!
//! Each link walks `Pending → Resolving → Relaying → Delivered | Failed`
//! with its own status message in the chat. Links from one message are
//! processed one after another; a failed link never stops the next one.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{ChatReply, Resolver, StatusHandle};
use crate::domain::{RelayOutcome, ResolutionResult, SourceLink};

use super::extractor::LinkExtractor;
use super::relay::MediaRelay;

const STATUS_PROCESSING: &str = "⏳ Processing link...";
const STATUS_SENDING: &str = "⏳ Sending video...";

/// Lifecycle of one detected link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Pending,
    Resolving,
    Relaying,
    Delivered,
    Failed,
}

impl LinkState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: LinkState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Resolving)
                | (Self::Resolving, Self::Relaying)
                | (Self::Resolving, Self::Failed)
                | (Self::Relaying, Self::Delivered)
                | (Self::Relaying, Self::Failed)
        )
    }

    fn advance(&mut self, next: LinkState) {
        debug_assert!(self.can_transition_to(next), "{:?} -> {:?}", self, next);
        debug!(from = ?self, to = ?next, "Link state changed");
        *self = next;
    }
}

/// Text shown in place of the status message when a link fails
pub fn failure_text(outcome: &RelayOutcome) -> Option<String> {
    match outcome {
        RelayOutcome::Delivered { .. } => None,
        RelayOutcome::ResolutionFailed { reason } => {
            Some(format!("❌ Could not fetch the video: {}", reason))
        }
        RelayOutcome::TooLarge { direct_url } => Some(format!(
            "❌ The video is too large to send via Telegram. Direct link: {}",
            direct_url
        )),
        RelayOutcome::NoMediaFound => {
            Some("❌ Could not get a video link from the service response".to_string())
        }
        RelayOutcome::TransferFailed { .. } => {
            Some("❌ An error occurred while downloading the video".to_string())
        }
        RelayOutcome::DeliveryFailed { .. } => {
            Some("❌ An error occurred while sending the video".to_string())
        }
    }
}

/// Main relay pipeline
pub struct Orchestrator {
    extractor: LinkExtractor,
    resolver: Arc<dyn Resolver>,
    relay: MediaRelay,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(extractor: LinkExtractor, resolver: Arc<dyn Resolver>, relay: MediaRelay) -> Self {
        Self {
            extractor,
            resolver,
            relay,
        }
    }

    /// Process every supported link in a message.
    ///
    /// Returns one outcome per link, in processing order. A message without
    /// links produces no chat activity.
    #[instrument(skip_all)]
    pub async fn handle_message<C>(&self, text: &str, chat: &C) -> Vec<RelayOutcome>
    where
        C: ChatReply + ?Sized,
    {
        let links = self.extractor.extract(text);
        if links.is_empty() {
            return Vec::new();
        }

        info!(count = links.len(), "Found links in message");

        let mut outcomes = Vec::with_capacity(links.len());
        for link in &links {
            outcomes.push(self.process_link(link, chat).await);
        }
        outcomes
    }

    /// Run one link through resolution and relay
    #[instrument(skip(self, link, chat), fields(url = %link, host = %link.category()))]
    pub async fn process_link<C>(&self, link: &SourceLink, chat: &C) -> RelayOutcome
    where
        C: ChatReply + ?Sized,
    {
        let mut state = LinkState::Pending;

        let status = match chat.post_status(STATUS_PROCESSING).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Failed to post status message");
                None
            }
        };

        state.advance(LinkState::Resolving);
        let resolution = self.resolver.resolve(link.url()).await;

        let outcome = match resolution {
            ResolutionResult::Failed { message } => RelayOutcome::ResolutionFailed { reason: message },
            resolved @ ResolutionResult::Resolved { .. } => {
                state.advance(LinkState::Relaying);
                if let Some(status) = status {
                    edit_status(chat, status, STATUS_SENDING).await;
                }

                match self.relay.relay(resolved, chat).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(error = %format!("{:#}", e), "Failed to send video");
                        RelayOutcome::DeliveryFailed {
                            reason: format!("{:#}", e),
                        }
                    }
                }
            }
        };

        match failure_text(&outcome) {
            None => {
                state.advance(LinkState::Delivered);
                if let Some(status) = status {
                    if let Err(e) = chat.delete_status(status).await {
                        warn!(error = %format!("{:#}", e), "Failed to delete status message");
                    }
                }
            }
            Some(text) => {
                state.advance(LinkState::Failed);
                info!(?outcome, "Link failed");
                match status {
                    Some(status) => edit_status(chat, status, &text).await,
                    None => {
                        if let Err(e) = chat.post_status(&text).await {
                            warn!(error = %format!("{:#}", e), "Failed to report failure");
                        }
                    }
                }
            }
        }

        debug_assert!(state.is_terminal());
        outcome
    }
}

async fn edit_status<C>(chat: &C, status: StatusHandle, text: &str)
where
    C: ChatReply + ?Sized,
{
    if let Err(e) = chat.edit_status(status, text).await {
        warn!(error = %format!("{:#}", e), "Failed to edit status message");
    }
}
