//! Media relay: fetch, stage, classify and hand off one resolved link.
//!
//! The download is streamed into a `StagedArtifact` under the scratch
//! directory. The size ceiling is checked against the declared content
//! length, after every chunk write, and once more on the finished file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::adapters::DeliverySink;
use crate::domain::{MediaReference, RelayOutcome, ResolutionResult};

use super::limits::{RelayLimits, SizeViolation};
use super::staging::StagedArtifact;

/// Container used when nothing better is known
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Extensions accepted from a media URL path
const KNOWN_EXTENSIONS: [&str; 4] = ["mp4", "webm", "mov", "mkv"];

/// Errors that end a transfer early
#[derive(Debug, Error)]
enum TransferError {
    #[error(transparent)]
    TooLarge(#[from] SizeViolation),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streams resolved media into scratch storage and delivers it
pub struct MediaRelay {
    client: reqwest::Client,
    limits: RelayLimits,
    scratch_dir: PathBuf,
}

impl MediaRelay {
    /// Create a relay staging files under `scratch_dir`
    pub fn new(limits: RelayLimits, scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build media HTTP client")?;

        Ok(Self {
            client,
            limits,
            scratch_dir: scratch_dir.into(),
        })
    }

    /// Relay a resolution result into `sink`.
    ///
    /// Every remote or storage failure is an `Ok` outcome. `Err` is only
    /// returned when the sink itself fails, and the caller reports it as
    /// `DeliveryFailed`. The staging file is removed before returning in
    /// either case.
    pub async fn relay<S>(&self, result: ResolutionResult, sink: &S) -> Result<RelayOutcome>
    where
        S: DeliverySink + ?Sized,
    {
        let candidates = match result {
            ResolutionResult::Failed { message } => {
                return Ok(RelayOutcome::ResolutionFailed { reason: message })
            }
            ResolutionResult::Resolved { candidates } => candidates,
        };

        let Some(media) = select_media_url(&candidates) else {
            error!(?candidates, "No usable media URL in resolver response");
            return Ok(RelayOutcome::NoMediaFound);
        };

        self.relay_media(media, sink).await
    }

    #[instrument(skip(self, media, sink), fields(media_url = %media.url))]
    async fn relay_media<S>(&self, media: &MediaReference, sink: &S) -> Result<RelayOutcome>
    where
        S: DeliverySink + ?Sized,
    {
        info!("Downloading video");

        let artifact = match self.download(media).await {
            Ok(artifact) => artifact,
            Err(TransferError::TooLarge(violation)) => {
                warn!(%violation, "Video too large to relay");
                return Ok(RelayOutcome::TooLarge {
                    direct_url: media.url.clone(),
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to download video");
                return Ok(RelayOutcome::TransferFailed {
                    reason: e.to_string(),
                });
            }
        };

        info!(
            size_mb = %format!("{:.2}", artifact.size_bytes() as f64 / 1024.0 / 1024.0),
            extension = artifact.extension(),
            "Video downloaded"
        );

        sink.deliver(&artifact)
            .await
            .context("Failed to deliver video")?;

        info!("Video delivered");
        Ok(RelayOutcome::Delivered {
            extension: artifact.extension(),
            size_bytes: artifact.size_bytes(),
        })
    }

    /// Fetch `media` into a new staging file
    async fn download(&self, media: &MediaReference) -> Result<StagedArtifact, TransferError> {
        let response = self
            .client
            .get(&media.url)
            .timeout(self.limits.download_timeout())
            .send()
            .await?
            .error_for_status()?;

        self.limits.check_declared(response.content_length())?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let extension = infer_extension(content_type.as_deref(), &media.url);

        let mut artifact = StagedArtifact::create(&self.scratch_dir, extension).await?;
        info!(path = %artifact.path().display(), "Saving video to staging file");

        let chunk_size = self.limits.chunk_size.max(1);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for piece in chunk.chunks(chunk_size) {
                let written = artifact.write_chunk(piece).await?;
                self.limits.check_streamed(written)?;
            }
        }

        let size = artifact.finish().await?;
        self.limits.check_final(size)?;

        Ok(artifact)
    }
}

/// First viable candidate, in resolver priority order
pub fn select_media_url(candidates: &[MediaReference]) -> Option<&MediaReference> {
    candidates.iter().find(|c| c.is_viable())
}

/// Pick a container extension for downloaded media.
///
/// A `video/*`-like content type wins: `webm`, `quicktime`/`mov` and
/// `matroska` map to their containers, anything else to mp4. Otherwise the
/// extension of the URL path is used when it is a known container.
pub fn infer_extension(content_type: Option<&str>, url: &str) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains("video") {
        if content_type.contains("webm") {
            return "webm";
        }
        if content_type.contains("quicktime") || content_type.contains("mov") {
            return "mov";
        }
        if content_type.contains("matroska") {
            return "mkv";
        }
        return DEFAULT_EXTENSION;
    }

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    KNOWN_EXTENSIONS
        .into_iter()
        .find(|known| *known == extension)
        .unwrap_or(DEFAULT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(infer_extension(Some("video/mp4"), "https://a/b"), "mp4");
        assert_eq!(infer_extension(Some("video/webm"), "https://a/b.mp4"), "webm");
        assert_eq!(infer_extension(Some("video/quicktime"), "https://a/b"), "mov");
        assert_eq!(infer_extension(Some("Video/X-Matroska"), "https://a/b"), "mkv");
        assert_eq!(infer_extension(Some("video/x-flv"), "https://a/b.webm"), "mp4");
    }

    #[test]
    fn test_extension_from_url_path() {
        assert_eq!(
            infer_extension(None, "https://cdn.example/path/clip.webm?sig=abc.mp4"),
            "webm"
        );
        assert_eq!(
            infer_extension(Some("application/octet-stream"), "https://cdn.example/clip.MOV"),
            "mov"
        );
        assert_eq!(infer_extension(Some(""), "https://cdn.example/clip.mkv#t=1"), "mkv");
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        assert_eq!(infer_extension(None, "https://cdn.example/clip.avi"), "mp4");
        assert_eq!(infer_extension(None, "https://cdn.example/stream"), "mp4");
        assert_eq!(infer_extension(None, ""), "mp4");
    }

    #[test]
    fn test_select_first_viable() {
        let candidates = vec![
            MediaReference::new(""),
            MediaReference::new("not a url"),
            MediaReference::new("https://cdn.example/a.mp4"),
            MediaReference::new("https://cdn.example/b.mp4"),
        ];
        assert_eq!(
            select_media_url(&candidates).map(|c| c.url.as_str()),
            Some("https://cdn.example/a.mp4")
        );
        assert!(select_media_url(&[]).is_none());
    }
}
