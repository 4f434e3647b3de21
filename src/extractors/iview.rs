//! ABC iview catch-up program extractor.
//!
//! Program pages embed a `videoParams = {...};` configuration. Its playlist
//! entry of type `program` lists HLS manifests per quality tier; those are
//! only served with an `hdnea` token issued by the iview auth endpoint for
//! an HMAC-signed request.
//!
//! # URL Pattern
//!
//! `https://iview.abc.net.au/programs/<program slug>/<episode id>`

use crate::error::ExtractError;
use crate::fetch::PageFetcher;
use crate::formats::sort_formats;
use crate::hls::{HlsOptions, extract_m3u8_formats};
use crate::html::Page;
use crate::jsonish::parse_json;
use crate::models::{MediaFormat, MediaRecord, SubtitleTrack};
use crate::utils::{int_or_none, parse_iso8601, str_to_int, truncate_for_log, unix_now, update_url_query};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

pub const SITE_NAME: &str = "abc.net.au:iview";

/// iview only serves streams to Australian clients.
pub const GEO_COUNTRIES: &[&str] = &["AU"];

const SIGNING_SECRET: &[u8] = b"android.content.res.Resources";
const TOKEN_HOST: &str = "http://iview.abc.net.au";

/// Quality tiers in order of preference; the first one yielding formats wins.
const QUALITY_TIERS: [&str; 2] = ["sd", "sd-low"];

const HLS: HlsOptions<'static> = HlsOptions {
    ext: "mp4",
    protocol: "m3u8_native",
    m3u8_id: "hls",
};

type HmacSha256 = Hmac<Sha256>;

static VALID_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://iview\.abc\.net\.au/programs/[^/]+/(?P<id>[^/?#]+)").unwrap()
});

static VIDEO_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"videoParams\s*=\s*(?P<params>\{.+?\});").unwrap());

pub fn suitable(url: &str) -> bool {
    VALID_URL.is_match(url)
}

/// The episode id, the last path segment of the program URL.
pub fn match_id(url: &str) -> Option<String> {
    VALID_URL
        .captures(url)
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string())
}

/// Path and query of the token request, before signing.
pub fn signing_path(timestamp: i64, house_number: &str) -> String {
    format!("/auth/hls/sign?ts={timestamp}&hn={house_number}&d=android-mobile")
}

/// Lowercase hex HMAC-SHA256 of `path` under the shared iview secret.
pub fn sign(path: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(SIGNING_SECRET).expect("HMAC can take key of any size");
    mac.update(path.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Extractor for iview program pages.
///
/// Holds no state besides the borrowed fetcher and the clock used to stamp
/// token requests, so concurrent extractions never interfere.
pub struct IviewExtractor<'a, F> {
    fetcher: &'a F,
    clock: fn() -> i64,
}

impl<'a, F: PageFetcher> IviewExtractor<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self {
            fetcher,
            clock: unix_now,
        }
    }

    /// Replace the unix-time source used for the signed token request.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Extract the program at `url`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::ExtractionFailed`] when `videoParams` or a title is missing
    /// - [`ExtractError::MalformedData`] when `videoParams` is not valid JSON
    /// - [`ExtractError::NoStreamAvailable`] when there is no `program` entry
    ///   or no quality tier yields a format
    /// - [`ExtractError::UpstreamAuthFailure`] when no usable token is issued
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn extract(&self, url: &str) -> Result<MediaRecord, ExtractError> {
        let video_id = match_id(url).ok_or_else(|| ExtractError::UnsupportedUrl(url.to_string()))?;
        let webpage = self.fetcher.fetch_text(url, &video_id).await?;

        let params_src = VIDEO_PARAMS
            .captures(&webpage)
            .and_then(|caps| caps.name("params"))
            .ok_or_else(|| ExtractError::ExtractionFailed("Unable to extract video params".to_string()))?;
        let video_params = parse_json(params_src.as_str(), "video params")?;

        let title = non_empty_str(&video_params, "title")
            .or_else(|| non_empty_str(&video_params, "seriesTitle"))
            .ok_or_else(|| ExtractError::ExtractionFailed("Unable to extract title".to_string()))?
            .to_string();
        let stream = find_program_stream(&video_params)
            .ok_or_else(|| ExtractError::NoStreamAvailable("no program stream found".to_string()))?;

        let house_number = non_empty_str(&video_params, "episodeHouseNumber").unwrap_or(video_id.as_str());
        let path = signing_path((self.clock)(), house_number);
        let token = self.fetch_token(&path, &video_id).await?;

        let mut formats = self.extract_tier_formats(stream, &token, &video_id).await?;
        sort_formats(&mut formats);

        let mut subtitles = BTreeMap::new();
        if let Some(src_vtt) = stream
            .get("captions")
            .and_then(|c| c.get("src-vtt"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            subtitles.insert(
                "en".to_string(),
                vec![SubtitleTrack {
                    url: src_vtt.to_string(),
                    ext: "vtt".to_string(),
                }],
            );
        }

        let page = Page::parse(&webpage);
        let series_id = non_empty_str(&video_params, "seriesHouseNumber")
            .map(str::to_string)
            .unwrap_or_else(|| video_id.chars().take(7).collect());
        let record = MediaRecord {
            title,
            description: page.meta_content(&["og:description", "twitter:description"]),
            thumbnail: page.meta_content(&["og:image", "twitter:image:src"]),
            formats,
            duration: int_or_none(video_params.get("eventDuration")),
            timestamp: parse_iso8601(video_params.get("pubDate").and_then(Value::as_str), ' '),
            series: non_empty_str(&video_params, "seriesTitle").map(str::to_string),
            series_id: Some(series_id),
            episode_number: page.meta_content(&["episodeNumber"]).as_deref().and_then(str_to_int),
            episode: page.meta_content(&["episode_title"]),
            uploader_id: non_empty_str(&video_params, "channel").map(str::to_string),
            subtitles,
            extractor: SITE_NAME.to_string(),
            id: video_id,
        };
        info!(
            id = %record.id,
            title = %record.title,
            formats = record.formats.len(),
            subtitles = record.subtitles.len(),
            "Extracted iview program"
        );
        Ok(record)
    }

    /// Request an `hdnea` token for the signed `path`.
    async fn fetch_token(&self, path: &str, video_id: &str) -> Result<String, ExtractError> {
        let token_url = format!("{TOKEN_HOST}{path}&sig={}", sign(path));
        debug!(%token_url, "Requesting stream token");

        let body = self
            .fetcher
            .fetch_text(&token_url, video_id)
            .await
            .map_err(|e| ExtractError::UpstreamAuthFailure(format!("token request failed: {e}")))?;
        let token = body.trim();
        if token.is_empty() || token.contains(char::is_whitespace) || token.contains('<') {
            warn!(body = %truncate_for_log(token, 120), "Unusable token response");
            return Err(ExtractError::UpstreamAuthFailure(
                "token endpoint returned an unusable response".to_string(),
            ));
        }
        Ok(token.to_string())
    }

    /// Formats of the first quality tier whose manifest yields any.
    async fn extract_tier_formats(
        &self,
        stream: &Value,
        token: &str,
        video_id: &str,
    ) -> Result<Vec<MediaFormat>, ExtractError> {
        for tier in QUALITY_TIERS {
            let Some(tier_url) = stream
                .get("streams")
                .and_then(|s| s.get("hls"))
                .and_then(|h| h.get(tier))
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
            else {
                debug!(tier, "Quality tier not offered");
                continue;
            };

            let manifest_url = match update_url_query(tier_url, &[("hdnea", token)]) {
                Ok(u) => u,
                Err(e) => {
                    warn!(tier, error = %e, "Invalid manifest URL");
                    continue;
                }
            };
            let formats = extract_m3u8_formats(self.fetcher, &manifest_url, video_id, HLS).await;
            if !formats.is_empty() {
                info!(tier, count = formats.len(), "Selected quality tier");
                return Ok(formats);
            }
            warn!(tier, "Quality tier yielded no formats");
        }
        Err(ExtractError::NoStreamAvailable(
            "no quality tier yielded any formats".to_string(),
        ))
    }
}

/// The first playlist entry tagged as the program itself.
fn find_program_stream(video_params: &Value) -> Option<&Value> {
    video_params
        .get("playlist")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("program"))
}

fn non_empty_str<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
