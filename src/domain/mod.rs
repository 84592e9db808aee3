//! Domain types for the relay pipeline.
//!
//! This module contains the plain data passed between components:
//! - Link: recognized video-post links found in message text
//! - Media: resolver responses and the media references they carry
//! - Outcome: the final result of relaying one link

pub mod link;
pub mod media;
pub mod outcome;

// Re-export commonly used types
pub use link::{HostCategory, SourceLink};
pub use media::{MediaReference, ResolutionResult, ResolverResponse, VideoEntry};
pub use outcome::RelayOutcome;
