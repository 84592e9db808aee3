//! reelay - Telegram relay for short-form video links
//!
//! Watches chat messages for Instagram reel/post and Twitter/X status links,
//! resolves each one to a direct media URL through a cobalt API instance,
//! and uploads the media back into the chat.
//!
//! # Architecture
//!
//! ```text
//! message text → LinkExtractor → [links] → CobaltClient → MediaRelay → Telegram
//! ```
//!
//! - Downloads are streamed into a temporary file with a 50 MiB ceiling
//! - Oversized media is offered as a direct link instead
//! - Every temporary file is removed however the relay ends
//!
//! # Modules
//!
//! - `adapters`: External system integrations (cobalt, Telegram)
//! - `core`: Relay logic (extractor, relay, staging, orchestrator)
//! - `domain`: Data structures (links, resolution results, outcomes)
//! - `bot`: Telegram long-polling loop
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Start the bot
//! TELEGRAM_TOKEN=... COBALT_API_URL=http://localhost:9000 reelay run
//!
//! # Check which links a text contains
//! reelay links "look https://instagram.com/reel/ABC123"
//! ```

pub mod adapters;
pub mod bot;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{LinkExtractor, MediaRelay, Orchestrator, RelayLimits, StagedArtifact};
pub use domain::{HostCategory, MediaReference, RelayOutcome, ResolutionResult, SourceLink};

// Telegram integration
pub use adapters::{TelegramClient, TelegramReply};
