//! Page fetching collaborator injected into every extractor.
//!
//! Extractors never talk to the network directly; they receive a
//! [`PageFetcher`]. [`HttpFetcher`] is the reqwest-backed implementation
//! used by the binary, while tests feed fixture pages through an in-memory
//! fetcher.

use crate::error::ExtractError;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Default desktop browser user agent; some ABC endpoints reject unknown clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Trait for fetching a resource as text.
///
/// Implementors must be safe to share between concurrent extractions; the
/// extractors only ever borrow them immutably.
pub trait PageFetcher {
    /// Fetch `url` and return its body.
    ///
    /// `video_id` is the identifier of the extraction the request belongs
    /// to and is used for logging only.
    async fn fetch_text(&self, url: &str, video_id: &str) -> Result<String, ExtractError>;
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`PageFetcher`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractError::fetch("<client>", e))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url, %video_id))]
    async fn fetch_text(&self, url: &str, video_id: &str) -> Result<String, ExtractError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Request failed");
                ExtractError::fetch(url, e)
            })?;
        let body = response.text().await.map_err(|e| ExtractError::fetch(url, e))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Downloaded"
        );
        Ok(body)
    }
}
