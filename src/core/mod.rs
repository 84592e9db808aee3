//! Core relay logic.
//!
//! This module contains:
//! - Extractor: link recognition in message text
//! - Limits: size ceiling and timeouts
//! - Staging: scoped temporary files
//! - Relay: streaming download and hand-off
//! - Orchestrator: per-message pipeline

pub mod extractor;
pub mod limits;
pub mod orchestrator;
pub mod relay;
pub mod staging;

// Re-export commonly used types
pub use extractor::LinkExtractor;
pub use limits::{RelayLimits, SizeViolation, DEFAULT_MAX_BYTES};
pub use orchestrator::{failure_text, LinkState, Orchestrator};
pub use relay::{infer_extension, select_media_url, MediaRelay};
pub use staging::StagedArtifact;
