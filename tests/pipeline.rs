//! Pipeline Integration Tests
//!
//! Runs whole messages through the orchestrator with an in-memory resolver
//! and chat, and a mock media origin.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use reelay::adapters::{ChatReply, CobaltClient, DeliverySink, Resolver, StatusHandle};
use reelay::core::{LinkExtractor, MediaRelay, Orchestrator, RelayLimits, StagedArtifact};
use reelay::domain::{MediaReference, RelayOutcome, ResolutionResult};

/// Resolver answering from a fixed table
#[derive(Default)]
struct TableResolver {
    answers: HashMap<String, ResolutionResult>,
    calls: Mutex<Vec<String>>,
}

impl TableResolver {
    fn with(mut self, url: &str, result: ResolutionResult) -> Self {
        self.answers.insert(url.to_string(), result);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for TableResolver {
    fn name(&self) -> &str {
        "table"
    }

    async fn resolve(&self, source_url: &str) -> ResolutionResult {
        self.calls.lock().unwrap().push(source_url.to_string());
        self.answers
            .get(source_url)
            .cloned()
            .unwrap_or_else(|| ResolutionResult::failed("connection error"))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatEvent {
    Posted(i64, String),
    Edited(i64, String),
    Deleted(i64),
    Video(String),
}

/// Chat that records every call
#[derive(Default)]
struct RecordingChat {
    events: Mutex<Vec<ChatEvent>>,
    next_id: Mutex<i64>,
    reject_uploads: bool,
}

impl RecordingChat {
    fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliverySink for RecordingChat {
    async fn deliver(&self, artifact: &StagedArtifact) -> Result<()> {
        assert!(artifact.path().exists());
        if self.reject_uploads {
            anyhow::bail!("Telegram API error in sendVideo: Request Entity Too Large");
        }
        self.events
            .lock()
            .unwrap()
            .push(ChatEvent::Video(artifact.file_name()));
        Ok(())
    }
}

#[async_trait]
impl ChatReply for RecordingChat {
    async fn post_status(&self, text: &str) -> Result<StatusHandle> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.events
            .lock()
            .unwrap()
            .push(ChatEvent::Posted(id, text.to_string()));
        Ok(StatusHandle(id))
    }

    async fn edit_status(&self, status: StatusHandle, text: &str) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(ChatEvent::Edited(status.0, text.to_string()));
        Ok(())
    }

    async fn delete_status(&self, status: StatusHandle) -> Result<()> {
        self.events.lock().unwrap().push(ChatEvent::Deleted(status.0));
        Ok(())
    }
}

fn orchestrator(resolver: Arc<TableResolver>, scratch: &std::path::Path) -> Orchestrator {
    let relay = MediaRelay::new(RelayLimits::default(), scratch).unwrap();
    Orchestrator::new(LinkExtractor::new().unwrap(), resolver, relay)
}

#[tokio::test]
async fn test_message_without_links_does_nothing() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(TableResolver::default());
    let chat = RecordingChat::default();

    let outcomes = orchestrator(Arc::clone(&resolver), temp.path())
        .handle_message("no links here", &chat)
        .await;

    assert!(outcomes.is_empty());
    assert!(chat.events().is_empty());
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_failed_resolution_then_success() {
    let temp = TempDir::new().unwrap();

    let mut server = mockito::Server::new_async().await;
    let media = server
        .mock("GET", "/video.mp4")
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .with_body(vec![1u8; 2048])
        .expect(1)
        .create_async()
        .await;

    let first = "https://instagram.com/reel/FIRST";
    let second = "https://instagram.com/reel/SECOND";
    let resolver = Arc::new(
        TableResolver::default()
            .with(first, ResolutionResult::failed("rate limited"))
            .with(
                second,
                ResolutionResult::Resolved {
                    candidates: vec![MediaReference::new(format!("{}/video.mp4", server.url()))],
                },
            ),
    );
    let chat = RecordingChat::default();

    let text = format!("{} and {}", first, second);
    let outcomes = orchestrator(Arc::clone(&resolver), temp.path())
        .handle_message(&text, &chat)
        .await;

    assert_eq!(
        outcomes,
        vec![
            RelayOutcome::ResolutionFailed {
                reason: "rate limited".to_string()
            },
            RelayOutcome::Delivered {
                extension: "mp4",
                size_bytes: 2048
            },
        ]
    );
    assert_eq!(resolver.calls(), vec![first.to_string(), second.to_string()]);

    let events = chat.events();
    assert_eq!(
        events,
        vec![
            ChatEvent::Posted(1, "⏳ Processing link...".to_string()),
            ChatEvent::Edited(1, "❌ Could not fetch the video: rate limited".to_string()),
            ChatEvent::Posted(2, "⏳ Processing link...".to_string()),
            ChatEvent::Edited(2, "⏳ Sending video...".to_string()),
            ChatEvent::Video("video.mp4".to_string()),
            ChatEvent::Deleted(2),
        ]
    );
    media.assert_async().await;
}

#[tokio::test]
async fn test_application_error_skips_download() {
    let temp = TempDir::new().unwrap();

    let mut cobalt = mockito::Server::new_async().await;
    let _api = cobalt
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"error","text":"rate limited"}"#)
        .create_async()
        .await;

    let mut origin = mockito::Server::new_async().await;
    let media = origin
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resolver = Arc::new(CobaltClient::new(cobalt.url(), Duration::from_secs(5)));
    let relay = MediaRelay::new(RelayLimits::default(), temp.path()).unwrap();
    let orchestrator = Orchestrator::new(LinkExtractor::new().unwrap(), resolver, relay);
    let chat = RecordingChat::default();

    let outcomes = orchestrator
        .handle_message("https://x.com/someone/status/12345", &chat)
        .await;

    assert_eq!(
        outcomes,
        vec![RelayOutcome::ResolutionFailed {
            reason: "rate limited".to_string()
        }]
    );
    assert!(!chat
        .events()
        .iter()
        .any(|e| matches!(e, ChatEvent::Video(_))));
    media.assert_async().await;
}

#[tokio::test]
async fn test_too_large_offers_direct_link() {
    let temp = TempDir::new().unwrap();

    let mut server = mockito::Server::new_async().await;
    let _media = server
        .mock("GET", "/huge.mp4")
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .with_body(vec![0u8; 4096])
        .create_async()
        .await;

    let link = "https://www.instagram.com/p/HUGE";
    let direct = format!("{}/huge.mp4", server.url());
    let resolver = Arc::new(TableResolver::default().with(
        link,
        ResolutionResult::Resolved {
            candidates: vec![MediaReference::new(direct.clone())],
        },
    ));

    let limits = RelayLimits {
        max_bytes: 1024,
        ..Default::default()
    };
    let relay = MediaRelay::new(limits, temp.path()).unwrap();
    let orchestrator = Orchestrator::new(LinkExtractor::new().unwrap(), resolver, relay);
    let chat = RecordingChat::default();

    let outcomes = orchestrator.handle_message(link, &chat).await;

    assert_eq!(
        outcomes,
        vec![RelayOutcome::TooLarge {
            direct_url: direct.clone()
        }]
    );
    let last = chat.events().pop().unwrap();
    assert_eq!(
        last,
        ChatEvent::Edited(
            1,
            format!(
                "❌ The video is too large to send via Telegram. Direct link: {}",
                direct
            )
        )
    );
}

#[tokio::test]
async fn test_no_media_found_reports_generic_failure() {
    let temp = TempDir::new().unwrap();

    let link = "https://twitter.com/a/status/9";
    let resolver = Arc::new(TableResolver::default().with(
        link,
        ResolutionResult::Resolved { candidates: vec![] },
    ));
    let chat = RecordingChat::default();

    let outcomes = orchestrator(resolver, temp.path())
        .handle_message(link, &chat)
        .await;

    assert_eq!(outcomes, vec![RelayOutcome::NoMediaFound]);
    assert!(matches!(
        chat.events().last(),
        Some(ChatEvent::Edited(1, text)) if text.starts_with("❌")
    ));
}

#[tokio::test]
async fn test_upload_failure_reports_sending_error() {
    let temp = TempDir::new().unwrap();

    let mut server = mockito::Server::new_async().await;
    let _media = server
        .mock("GET", "/video.mp4")
        .with_status(200)
        .with_header("content-type", "video/mp4")
        .with_body(vec![1u8; 512])
        .create_async()
        .await;

    let link = "https://instagram.com/reel/UPLOAD";
    let resolver = Arc::new(TableResolver::default().with(
        link,
        ResolutionResult::Resolved {
            candidates: vec![MediaReference::new(format!("{}/video.mp4", server.url()))],
        },
    ));
    let chat = RecordingChat {
        reject_uploads: true,
        ..Default::default()
    };

    let outcomes = orchestrator(resolver, temp.path())
        .handle_message(link, &chat)
        .await;

    assert!(matches!(
        outcomes.as_slice(),
        [RelayOutcome::DeliveryFailed { reason }] if reason.contains("Request Entity Too Large")
    ));
    assert_eq!(
        chat.events().last(),
        Some(&ChatEvent::Edited(
            1,
            "❌ An error occurred while sending the video".to_string()
        ))
    );
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}
