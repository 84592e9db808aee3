//! Adapter interfaces for external systems.
//!
//! The relay core talks to three collaborators through these traits:
//! - `Resolver`: turns a source link into media references (cobalt)
//! - `DeliverySink`: uploads a staged artifact into the chat
//! - `ChatReply`: the per-message progress indicator

pub mod cobalt;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::StagedArtifact;
use crate::domain::ResolutionResult;

// Re-export the concrete adapters
pub use cobalt::{CobaltClient, ResolveError};
pub use telegram::{TelegramClient, TelegramReply};

/// Identifier of a status message posted to the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusHandle(pub i64);

/// Trait for link resolution services
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Human-readable resolver name
    fn name(&self) -> &str;

    /// Resolve a source URL. Every failure is reported in the result.
    async fn resolve(&self, source_url: &str) -> ResolutionResult;

    /// Reachability check
    async fn health_check(&self) -> Result<()>;
}

/// Receives finished artifacts for upload
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, artifact: &StagedArtifact) -> Result<()>;
}

/// Reply surface for one incoming message
#[async_trait]
pub trait ChatReply: DeliverySink {
    /// Post a new status message
    async fn post_status(&self, text: &str) -> Result<StatusHandle>;

    /// Replace the text of a status message
    async fn edit_status(&self, status: StatusHandle, text: &str) -> Result<()>;

    /// Remove a status message
    async fn delete_status(&self, status: StatusHandle) -> Result<()>;
}
