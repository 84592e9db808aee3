//! Cobalt API client for resolving post links to direct media URLs.
//!
//! Endpoint: POST <base> with `{"url": <source>}`
//! One attempt per link; failures come back as `ResolutionResult::Failed`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::domain::{ResolutionResult, ResolverResponse};

use super::Resolver;

/// Timeout for the startup reachability check
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// How much of an error body is logged
const LOGGED_BODY_CHARS: usize = 500;

/// Ways a resolution request can fail.
///
/// The display text is the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("connection error")]
    Connection,

    #[error("request error: {status}")]
    Request { status: String },

    #[error("invalid response")]
    InvalidResponse,

    #[error("{0}")]
    Application(String),
}

/// Cobalt API client
pub struct CobaltClient {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl CobaltClient {
    /// Create a new client for the API at `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one resolution request and decode the response
    async fn request(&self, source_url: &str) -> Result<ResolverResponse, ResolveError> {
        info!(endpoint = %self.endpoint, "Requesting cobalt API");

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&serde_json::json!({ "url": source_url }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to cobalt API");
                ResolveError::Connection
            })?;

        let status = response.status();
        info!(status = status.as_u16(), "Cobalt API responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(LOGGED_BODY_CHARS).collect();
            error!(%status, %body, "Cobalt API returned an error status");
            return Err(ResolveError::Request {
                status: status.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "Failed to read cobalt API response");
            ResolveError::Connection
        })?;

        parse_response(&body)
    }
}

/// Decode a response body; anything but a JSON object is invalid
fn parse_response(body: &[u8]) -> Result<ResolverResponse, ResolveError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "Failed to parse cobalt API response");
        ResolveError::InvalidResponse
    })?;

    if !value.is_object() {
        error!("Cobalt API response is not a JSON object");
        return Err(ResolveError::InvalidResponse);
    }

    serde_json::from_value(value).map_err(|e| {
        error!(error = %e, "Unexpected cobalt API response shape");
        ResolveError::InvalidResponse
    })
}

#[async_trait]
impl Resolver for CobaltClient {
    fn name(&self) -> &str {
        "cobalt"
    }

    #[instrument(skip(self))]
    async fn resolve(&self, source_url: &str) -> ResolutionResult {
        let outcome = self.request(source_url).await.and_then(|response| {
            match response.application_error() {
                Some(message) => Err(ResolveError::Application(message)),
                None => Ok(response),
            }
        });

        match outcome {
            Ok(response) => ResolutionResult::Resolved {
                candidates: response.candidates(),
            },
            Err(e) => {
                warn!(reason = %e, "Resolution failed");
                ResolutionResult::failed(e.to_string())
            }
        }
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Cobalt API unreachable at {}", self.endpoint))?;

        info!(status = response.status().as_u16(), "Cobalt API reachable");
        Ok(())
    }
}
