//! Size ceiling and timeouts for media relay.
//!
//! Enforced at three points of a transfer:
//! - the origin's declared content length, before any byte is stored
//! - the running total after each chunk write
//! - the final file size after the transfer completes

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Telegram's upload ceiling for bots
pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Limits applied to every relay operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLimits {
    /// Size ceiling in bytes (default: 50 MiB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Chunk size used when writing to the staging file (default: 8 KiB)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Resolver request timeout in seconds (default: 30)
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_seconds: u64,

    /// Media download timeout in seconds (default: 60)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_seconds: u64,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}
fn default_chunk_size() -> usize {
    8192
}
fn default_resolve_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    60
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            chunk_size: default_chunk_size(),
            resolve_timeout_seconds: default_resolve_timeout(),
            download_timeout_seconds: default_download_timeout(),
        }
    }
}

impl RelayLimits {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_seconds)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_seconds)
    }

    /// Check the origin's declared content length
    pub fn check_declared(&self, declared: Option<u64>) -> Result<(), SizeViolation> {
        match declared {
            Some(declared) if declared > self.max_bytes => Err(SizeViolation::Declared {
                declared,
                limit: self.max_bytes,
            }),
            _ => Ok(()),
        }
    }

    /// Check the running total after a chunk write
    pub fn check_streamed(&self, received: u64) -> Result<(), SizeViolation> {
        if received > self.max_bytes {
            return Err(SizeViolation::Streamed {
                received,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Check the size of the completed file
    pub fn check_final(&self, size: u64) -> Result<(), SizeViolation> {
        if size > self.max_bytes {
            return Err(SizeViolation::Final {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Size ceiling violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeViolation {
    #[error("Declared content length exceeds ceiling: {declared} > {limit}")]
    Declared { declared: u64, limit: u64 },

    #[error("Stream exceeded ceiling: {received} > {limit}")]
    Streamed { received: u64, limit: u64 },

    #[error("Downloaded file exceeds ceiling: {size} > {limit}")]
    Final { size: u64, limit: u64 },
}
