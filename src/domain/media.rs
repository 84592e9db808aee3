//! Resolver responses and the media references they carry.
//!
//! The resolver answers with a loosely shaped JSON object. Several keys may
//! carry the media URL; `ResolverResponse::candidates` turns them into an
//! ordered list so the relay can take the first viable one.

use serde::{Deserialize, Serialize};

/// A direct, fetchable URL for raw media bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Direct media URL
    pub url: String,
}

impl MediaReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Whether the reference points at something fetchable over HTTP
    pub fn is_viable(&self) -> bool {
        let url = self.url.trim();
        !url.is_empty() && url.starts_with("http")
    }
}

/// Outcome of resolving a source link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Candidate media references in priority order
    Resolved { candidates: Vec<MediaReference> },

    /// Resolution failed; `message` is shown to the user
    Failed { message: String },
}

impl ResolutionResult {
    /// Create a failed result
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// One entry of the `videos` list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoEntry {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, rename = "videoUrl")]
    pub video_url: Option<String>,
}

/// Error body attached to newer resolver error responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverErrorBody {
    #[serde(default)]
    pub code: Option<String>,
}

/// Structured view of the resolver's JSON response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverResponse {
    #[serde(default)]
    pub status: Option<String>,

    /// Error message, or on some responses the media URL itself
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub videos: Option<Vec<VideoEntry>>,

    #[serde(default)]
    pub video: Option<String>,

    #[serde(default)]
    pub error: Option<ResolverErrorBody>,
}

impl ResolverResponse {
    /// The application-level error message, if the response reports one
    pub fn application_error(&self) -> Option<String> {
        if self.status.as_deref() != Some("error") {
            return None;
        }

        let message = self
            .text
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| self.error.as_ref().and_then(|e| e.code.clone()))
            .unwrap_or_else(|| "unknown error".to_string());
        Some(message)
    }

    /// Media URL candidates in priority order.
    ///
    /// 1. `text`, when it is itself a URL
    /// 2. `url`
    /// 3. the first `videos` entry (`url`, then `videoUrl`)
    /// 4. `video`
    ///
    /// Empty values are skipped.
    pub fn candidates(&self) -> Vec<MediaReference> {
        let from_text = self.text.as_deref().filter(|t| t.starts_with("http"));

        let from_videos = self.videos.as_ref().and_then(|v| v.first()).and_then(|entry| {
            entry
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .or(entry.video_url.as_deref())
        });

        [
            from_text,
            self.url.as_deref(),
            from_videos,
            self.video.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|u| !u.trim().is_empty())
        .map(MediaReference::new)
        .collect()
    }
}
