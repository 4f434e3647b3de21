//! ABC News article extractor.
//!
//! Article pages embed their media as a JavaScript literal pushed into a
//! global array, e.g. `inlineAudioData.push([{url: ...}]);`. The block kind
//! decides the result: video and audio blocks become formats of a single
//! record, YouTube blocks become a playlist of redirects.
//!
//! # URL Pattern
//!
//! `https://www.abc.net.au/news/<date>/<slug>/<numeric id>`, where the date
//! segment is optional.

use crate::error::ExtractError;
use crate::fetch::PageFetcher;
use crate::formats::sort_formats;
use crate::html::{Page, clean_html};
use crate::jsonish::{into_list, parse_loose_json};
use crate::models::{Extraction, MediaFormat, MediaRecord, PlaylistRecord, UrlResult};
use crate::utils::{determine_ext, int_or_none};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{info, instrument, warn};

pub const SITE_NAME: &str = "abc.net.au";

static VALID_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?abc\.net\.au/news/(?:[^/]+/){1,2}(?P<id>\d+)").unwrap()
});

static INLINE_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"inline(?P<type>Video|Audio|YouTube)Data\.push\((?P<json_data>[^)]+)\);").unwrap()
});

static EXPIRED_BANNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)class="expired-(?:video|audio)".+?<span>(?P<text>.+?)</span>"#).unwrap()
});

/// Kind of inline data block found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Video,
    Audio,
    YouTube,
}

impl InlineKind {
    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "Video" => Some(InlineKind::Video),
            "Audio" => Some(InlineKind::Audio),
            "YouTube" => Some(InlineKind::YouTube),
            _ => None,
        }
    }
}

pub fn suitable(url: &str) -> bool {
    VALID_URL.is_match(url)
}

/// The numeric article id at the end of the URL.
pub fn match_id(url: &str) -> Option<String> {
    VALID_URL
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string())
}

/// Extract the media embedded in a news article.
///
/// # Returns
///
/// A [`Extraction::Media`] record for video and audio blocks, or an
/// [`Extraction::Playlist`] of YouTube URLs for the host to resolve.
///
/// # Errors
///
/// - [`ExtractError::ContentExpired`] when the page shows an expiry banner
///   instead of media
/// - [`ExtractError::ExtractionFailed`] when no inline block or title exists
/// - [`ExtractError::MalformedData`] when the block cannot be parsed
/// - [`ExtractError::NoStreamAvailable`] when no entry carries a URL
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn extract<F: PageFetcher>(fetcher: &F, url: &str) -> Result<Extraction, ExtractError> {
    let video_id = match_id(url).ok_or_else(|| ExtractError::UnsupportedUrl(url.to_string()))?;
    let webpage = fetcher.fetch_text(url, &video_id).await?;
    extract_from_page(&webpage, &video_id)
}

fn extract_from_page(webpage: &str, video_id: &str) -> Result<Extraction, ExtractError> {
    let Some(caps) = INLINE_DATA.captures(webpage) else {
        if let Some(banner) = EXPIRED_BANNER.captures(webpage) {
            let message = clean_html(&banner["text"]);
            warn!(%video_id, %message, "Media has expired");
            return Err(ExtractError::ContentExpired {
                site: SITE_NAME,
                message,
            });
        }
        return Err(ExtractError::ExtractionFailed(
            "Unable to extract video urls".to_string(),
        ));
    };

    let kind = InlineKind::from_marker(&caps["type"])
        .ok_or_else(|| ExtractError::ExtractionFailed("Unknown inline data type".to_string()))?;
    let urls_info = into_list(parse_loose_json(&caps["json_data"], "inline data")?);

    if kind == InlineKind::YouTube {
        let entries: Vec<UrlResult> = urls_info
            .iter()
            .filter_map(|info| match entry_url(info) {
                Some(url) => Some(UrlResult {
                    url: url.to_string(),
                    ie_key: Some("Youtube".to_string()),
                }),
                None => {
                    warn!(%video_id, "Skipping YouTube entry without url");
                    None
                }
            })
            .collect();
        if entries.is_empty() {
            return Err(ExtractError::NoStreamAvailable(
                "no YouTube entries with a url".to_string(),
            ));
        }
        info!(%video_id, count = entries.len(), "Found YouTube redirects");
        return Ok(Extraction::Playlist(PlaylistRecord {
            id: Some(video_id.to_string()),
            entries,
            extractor: SITE_NAME.to_string(),
        }));
    }

    let mut formats: Vec<MediaFormat> = urls_info
        .iter()
        .filter_map(|info| {
            let built = build_format(info, kind);
            if built.is_none() {
                warn!(%video_id, "Skipping format without url");
            }
            built
        })
        .collect();
    if formats.is_empty() {
        return Err(ExtractError::NoStreamAvailable(
            "no inline format carries a url".to_string(),
        ));
    }
    sort_formats(&mut formats);

    let page = Page::parse(webpage);
    let title = page
        .og_title()
        .ok_or_else(|| ExtractError::ExtractionFailed("Unable to extract OpenGraph title".to_string()))?;
    info!(%video_id, %title, formats = formats.len(), ?kind, "Extracted article media");

    Ok(Extraction::Media(MediaRecord {
        id: video_id.to_string(),
        title,
        description: page.og_description(),
        thumbnail: page.og_thumbnail(),
        formats,
        extractor: SITE_NAME.to_string(),
        ..Default::default()
    }))
}

fn entry_url(info: &Value) -> Option<&str> {
    info.get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
}

fn build_format(info: &Value, kind: InlineKind) -> Option<MediaFormat> {
    let url = entry_url(info)?;
    let vcodec = match kind {
        InlineKind::Video => info
            .get("codec")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        _ => Some("none".to_string()),
    };
    Some(MediaFormat {
        url: url.to_string(),
        ext: determine_ext(url, "mp4"),
        vcodec,
        width: int_or_none(info.get("width")),
        height: int_or_none(info.get("height")),
        tbr: int_or_none(info.get("bitrate")),
        filesize: int_or_none(info.get("filesize")),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FixtureFetcher;

    const AUDIO_URL: &str =
        "http://www.abc.net.au/news/2015-10-23/nab-lifts-interest-rates-following-westpac-and-cba/6880080";

    const AUDIO_PAGE: &str = r#"<!DOCTYPE html><html><head>
<meta property="og:title" content="NAB lifts interest rates, following Westpac and CBA">
<meta property="og:description" content="NAB has become the third of the big four banks to raise its variable mortgage rate.">
<meta property="og:image" content="http://www.abc.net.au/news/image/6880118-16x9-700x394.jpg">
</head><body>
<script type="text/javascript">
inlineAudioData.push([{"url":"http://mpegmedia.abc.net.au/news/audio/201510/r1497869_21947153.mp3","contentType":"audio/mpeg","codec":"MP3","bitrate":"128","width":"","height":"","filesize":"3254032"}]);
</script>
</body></html>"#;

    const VIDEO_PAGE: &str = r#"<html><head>
<meta property="og:title" content="Australia to help staff Ebola treatment centre">
</head><body><script>
inlineVideoData.push([
  {url: 'http://mpegmedia.abc.net.au/news/news24/wins/201411/WINs_Ebola_1000k.mp4', codec: 'h264', width: '1024', height: '576', bitrate: '1000', filesize: '20535872'},
  {url: 'http://mpegmedia.abc.net.au/news/news24/wins/201411/WINs_Ebola_512k.mp4', codec: 'h264', width: '512', height: '288', bitrate: '512', filesize: 'unknown'},
]);
</script></body></html>"#;

    const YOUTUBE_PAGE: &str = r#"<html><head><meta property="og:title" content="Marriage Equality"></head><body><script>
inlineYouTubeData.push([{url: "https://www.youtube.com/watch?v=NvqvPeNZsHU"}, {url: "https://www.youtube.com/watch?v=abc123"}]);
</script></body></html>"#;

    const EXPIRED_PAGE: &str = r#"<html><body>
<div class="expired-video">
  <p class="media-notice">
    <span>This video has expired and is no longer available.</span>
  </p>
</div></body></html>"#;

    #[test]
    fn test_match_id() {
        assert_eq!(match_id(AUDIO_URL).as_deref(), Some("6880080"));
        assert_eq!(
            match_id("http://www.abc.net.au/news/2015-10-19/6866214").as_deref(),
            Some("6866214")
        );
        assert_eq!(match_id("https://abc.net.au/news/a/b/c/123"), None);
        assert!(!suitable("http://www.abc.net.au/news/2015-10-19/"));
    }

    #[tokio::test]
    async fn test_audio_article() {
        let fetcher = FixtureFetcher::new().with_page(AUDIO_URL, AUDIO_PAGE);
        let Extraction::Media(record) = extract(&fetcher, AUDIO_URL).await.unwrap() else {
            panic!("expected a media record");
        };

        assert_eq!(record.id, "6880080");
        assert_eq!(record.title, "NAB lifts interest rates, following Westpac and CBA");
        assert_eq!(
            record.thumbnail.as_deref(),
            Some("http://www.abc.net.au/news/image/6880118-16x9-700x394.jpg")
        );
        assert!(record.description.is_some());
        assert_eq!(record.formats.len(), 1);

        let format = &record.formats[0];
        assert_eq!(format.ext, "mp3");
        assert_eq!(format.vcodec.as_deref(), Some("none"));
        assert_eq!(format.tbr, Some(128));
        assert_eq!(format.filesize, Some(3254032));
        assert_eq!(format.width, None);
        assert_eq!(format.height, None);
        assert_eq!(record.best_ext(), Some("mp3"));
    }

    #[tokio::test]
    async fn test_video_article_formats_sorted() {
        let url = "http://www.abc.net.au/news/2014-11-05/australia-to-staff-ebola-treatment-centre-in-sierra-leone/5868334";
        let fetcher = FixtureFetcher::new().with_page(url, VIDEO_PAGE);
        let Extraction::Media(record) = extract(&fetcher, url).await.unwrap() else {
            panic!("expected a media record");
        };

        assert_eq!(record.id, "5868334");
        assert_eq!(record.formats.len(), 2);
        assert!(record.formats.iter().all(|f| !f.url.is_empty()));
        assert_eq!(record.formats[0].height, Some(288));
        assert_eq!(record.formats[0].filesize, None);
        assert_eq!(record.formats[1].height, Some(576));
        assert_eq!(record.formats[1].vcodec.as_deref(), Some("h264"));
        assert_eq!(record.formats[1].ext, "mp4");
        assert_eq!(record.description, None);
    }

    #[tokio::test]
    async fn test_youtube_article_is_playlist() {
        let url = "http://www.abc.net.au/news/2015-08-17/warren-entsch-introduces-same-sex-marriage-bill/6702326";
        let fetcher = FixtureFetcher::new().with_page(url, YOUTUBE_PAGE);
        let Extraction::Playlist(playlist) = extract(&fetcher, url).await.unwrap() else {
            panic!("expected a playlist");
        };

        let urls: Vec<&str> = playlist.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=NvqvPeNZsHU",
                "https://www.youtube.com/watch?v=abc123"
            ]
        );
        assert!(playlist.entries.iter().all(|e| e.ie_key.as_deref() == Some("Youtube")));
        assert_eq!(playlist.id.as_deref(), Some("6702326"));
    }

    #[test]
    fn test_single_object_is_wrapped() {
        let page = r#"<meta property="og:title" content="One">
            <script>inlineVideoData.push({url: 'http://example.com/v.mp4', codec: 'h264'});</script>"#;
        let Extraction::Media(record) = extract_from_page(page, "1").unwrap() else {
            panic!("expected a media record");
        };
        assert_eq!(record.formats.len(), 1);
        assert_eq!(record.formats[0].url, "http://example.com/v.mp4");
    }

    #[test]
    fn test_expired_banner() {
        let err = extract_from_page(EXPIRED_PAGE, "5868334").unwrap_err();
        match err {
            ExtractError::ContentExpired { site, ref message } => {
                assert_eq!(site, "abc.net.au");
                assert_eq!(message, "This video has expired and is no longer available.");
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_expected());
    }

    #[test]
    fn test_no_inline_data() {
        let err = extract_from_page("<html><body>Nothing here</body></html>", "1").unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    }

    #[test]
    fn test_malformed_inline_data() {
        let page = "<script>inlineVideoData.push({url: 'http://example.com/v.mp4', );</script>";
        let err = extract_from_page(page, "1").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedData { .. }));
    }

    #[test]
    fn test_entries_without_url() {
        let page = r#"<meta property="og:title" content="T">
            <script>inlineAudioData.push([{codec: 'MP3'}, {url: ''}]);</script>"#;
        let err = extract_from_page(page, "1").unwrap_err();
        assert!(matches!(err, ExtractError::NoStreamAvailable(_)));
    }

    #[test]
    fn test_missing_title() {
        let page = "<script>inlineAudioData.push({url: 'http://example.com/a.mp3'});</script>";
        let err = extract_from_page(page, "1").unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_idempotent() {
        let fetcher = FixtureFetcher::new().with_page(AUDIO_URL, AUDIO_PAGE);
        let first = extract(&fetcher, AUDIO_URL).await.unwrap();
        let second = extract(&fetcher, AUDIO_URL).await.unwrap();
        assert_eq!(first, second);
    }
}
