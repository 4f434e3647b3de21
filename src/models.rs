//! Data models for extraction results.
//!
//! This module defines the records an extractor hands back to its host:
//! - [`MediaFormat`]: one downloadable variant of a media item
//! - [`MediaRecord`]: a single media item with its formats and metadata
//! - [`PlaylistRecord`]: a list of upstream URLs for the host to resolve
//! - [`Extraction`]: either of the two above
//!
//! Records are built once per extraction and never mutated afterwards.
//! Optional fields are omitted from the serialized info JSON.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One downloadable variant of a media item.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MediaFormat {
    /// Direct media URL. Never empty in a returned record.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    /// Container extension, e.g. `mp4` or `mp3`.
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Video codec, `"none"` for audio-only formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    /// Total bitrate in kbit/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl MediaFormat {
    /// `true` unless the format is explicitly audio-only.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }
}

/// A subtitle file attached to a media record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub ext: String,
}

/// The result of extracting a single media item.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MediaRecord {
    /// Identifier derived from the page URL.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Formats ordered worst to best.
    pub formats: Vec<MediaFormat>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Publication time as unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    /// Language code to subtitle tracks.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub subtitles: BTreeMap<String, Vec<SubtitleTrack>>,
    /// Name of the extractor that produced the record.
    pub extractor: String,
}

impl MediaRecord {
    /// The publication date as `YYYYMMDD` (UTC), derived from `timestamp`.
    pub fn upload_date(&self) -> Option<String> {
        self.timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y%m%d").to_string())
    }

    /// Extension of the best format, if any.
    pub fn best_ext(&self) -> Option<&str> {
        self.formats.last().map(|f| f.ext.as_str())
    }
}

/// A reference to a page that another extractor must resolve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UrlResult {
    pub url: String,
    /// Key of the extractor expected to handle `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ie_key: Option<String>,
}

/// An ordered list of upstream URLs, resolved independently by the host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaylistRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub entries: Vec<UrlResult>,
    pub extractor: String,
}

/// Outcome of a successful extraction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "_type", rename_all = "lowercase")]
pub enum Extraction {
    #[serde(rename = "video")]
    Media(MediaRecord),
    Playlist(PlaylistRecord),
}

impl Extraction {
    /// Identifier used for output file names.
    pub fn id(&self) -> Option<&str> {
        match self {
            Extraction::Media(record) => Some(&record.id),
            Extraction::Playlist(playlist) => playlist.id.as_deref(),
        }
    }
}
