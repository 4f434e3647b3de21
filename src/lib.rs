//! # abc_extract
//!
//! Extracts downloadable media metadata from two Australian Broadcasting
//! Corporation sites and normalizes it into a common record.
//!
//! ## Supported Sites
//!
//! - **ABC News articles**: inline video/audio blocks become a
//!   [`models::MediaRecord`]; embedded YouTube videos become a
//!   [`models::PlaylistRecord`] of redirects.
//! - **ABC iview programs**: the embedded program configuration, an
//!   HMAC-signed token request and the HLS manifest produce a
//!   [`models::MediaRecord`] with formats and subtitles.
//!
//! ## Architecture
//!
//! Extractors take an injected [`fetch::PageFetcher`], so they run against
//! the network through [`fetch::HttpFetcher`] or against fixture pages in
//! tests. Every call is independent: nothing is cached or shared between
//! extractions.
//!
//! ```ignore
//! let fetcher = HttpFetcher::new(&FetchConfig::default())?;
//! let extraction = abc_extract::extract(&fetcher, url).await?;
//! ```

pub mod cli;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod formats;
pub mod hls;
pub mod html;
pub mod jsonish;
pub mod models;
pub mod outputs;
pub mod utils;

pub use error::ExtractError;
pub use extractors::{Site, extract};
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher};
pub use models::{Extraction, MediaFormat, MediaRecord, PlaylistRecord};
