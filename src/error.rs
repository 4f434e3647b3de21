//! Error type shared by every extractor and host collaborator.
//!
//! Extraction either fully succeeds or fails with one [`ExtractError`]; no
//! partial record is ever returned. Hosts use [`ExtractError::is_expected`]
//! to decide whether a failure should skip the URL quietly or abort a batch.

use thiserror::Error;

/// Boxed source error carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for extraction operations
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The site states that the media is no longer available.
    #[error("{site} said: {message}")]
    ContentExpired { site: &'static str, message: String },

    /// The page no longer matches the expected markup.
    #[error("{0}; the site layout may have changed")]
    ExtractionFailed(String),

    /// An embedded data blob could not be parsed, even after normalization.
    #[error("failed to parse {what}: {source}")]
    MalformedData {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// No quality tier or entry produced a playable format.
    #[error("no stream available: {0}")]
    NoStreamAvailable(String),

    /// The token endpoint failed or returned something unusable.
    #[error("upstream authorization failed: {0}")]
    UpstreamAuthFailure(String),

    /// Transport or HTTP status failure while fetching a resource.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    /// No extractor matches the URL.
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),
}

impl ExtractError {
    /// Build a [`ExtractError::Fetch`] from any error source.
    pub fn fetch(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ExtractError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Expected failures are time-limited content, not bugs or layout changes.
    pub fn is_expected(&self) -> bool {
        matches!(self, ExtractError::ContentExpired { .. })
    }
}
