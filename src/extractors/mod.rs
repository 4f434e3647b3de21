//! Site extractors and URL dispatch.
//!
//! Each extractor module owns one site's URL shape and turns a page into an
//! [`Extraction`]. Extractors share nothing but the injected
//! [`PageFetcher`] and the helper modules.
//!
//! # Supported Sites
//!
//! | Site | Module | Method | Notes |
//! |------|--------|--------|-------|
//! | ABC News | [`abc`] | Inline `inline*Data.push(...)` blocks | Video, audio or YouTube redirects |
//! | ABC iview | [`iview`] | `videoParams` + signed HLS token | Geo-restricted to AU |

pub mod abc;
pub mod iview;

use crate::error::ExtractError;
use crate::fetch::PageFetcher;
use crate::models::Extraction;
use tracing::{info, instrument};

/// The sites this crate can extract from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    AbcNews,
    AbcIview,
}

impl Site {
    /// Pick the extractor whose URL pattern matches `url`.
    pub fn for_url(url: &str) -> Option<Self> {
        if abc::suitable(url) {
            Some(Site::AbcNews)
        } else if iview::suitable(url) {
            Some(Site::AbcIview)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Site::AbcNews => abc::SITE_NAME,
            Site::AbcIview => iview::SITE_NAME,
        }
    }

    /// Countries the site serves media to; empty when unrestricted.
    pub fn geo_countries(self) -> &'static [&'static str] {
        match self {
            Site::AbcNews => &[],
            Site::AbcIview => iview::GEO_COUNTRIES,
        }
    }
}

/// Extract media information from `url` with the matching site extractor.
///
/// The site extractor's span records the URL.
#[instrument(level = "info", skip_all)]
pub async fn extract<F: PageFetcher>(fetcher: &F, url: &str) -> Result<Extraction, ExtractError> {
    let site = Site::for_url(url).ok_or_else(|| ExtractError::UnsupportedUrl(url.to_string()))?;
    info!(site = site.name(), "Dispatching extraction");
    match site {
        Site::AbcNews => abc::extract(fetcher, url).await,
        Site::AbcIview => iview::IviewExtractor::new(fetcher)
            .extract(url)
            .await
            .map(Extraction::Media),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FixtureFetcher;

    #[test]
    fn test_site_for_url() {
        assert_eq!(
            Site::for_url("http://www.abc.net.au/news/2015-10-19/6866214"),
            Some(Site::AbcNews)
        );
        assert_eq!(
            Site::for_url("http://iview.abc.net.au/programs/call-the-midwife/ZW0898A003S00"),
            Some(Site::AbcIview)
        );
        assert_eq!(Site::for_url("https://www.youtube.com/watch?v=NvqvPeNZsHU"), None);
    }

    #[test]
    fn test_site_metadata() {
        assert_eq!(Site::AbcNews.name(), "abc.net.au");
        assert_eq!(Site::AbcIview.name(), "abc.net.au:iview");
        assert!(Site::AbcNews.geo_countries().is_empty());
        assert_eq!(Site::AbcIview.geo_countries(), &["AU"]);
    }

    #[tokio::test]
    async fn test_extract_rejects_unsupported_url() {
        let fetcher = FixtureFetcher::new();
        let err = extract(&fetcher, "https://example.com/video/1").await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedUrl(_)));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_extract_routes_news_articles() {
        let url = "http://www.abc.net.au/news/2015-10-19/6866214";
        let page = r#"<html><head><meta property="og:title" content="Rates"></head>
            <body><script>inlineAudioData.push({url: 'http://example.com/a.mp3'});</script></body></html>"#;
        let fetcher = FixtureFetcher::new().with_page(url, page);

        match extract(&fetcher, url).await.unwrap() {
            Extraction::Media(record) => {
                assert_eq!(record.id, "6866214");
                assert_eq!(record.extractor, "abc.net.au");
            }
            other => panic!("expected media, got {other:?}"),
        }
    }
}
