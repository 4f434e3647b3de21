//! HLS manifest parsing into [`MediaFormat`]s.
//!
//! Handles just enough of M3U8 for catch-up streams: a master playlist
//! yields one format per `#EXT-X-STREAM-INF` variant, a media playlist
//! yields a single format pointing at the manifest itself.

use crate::fetch::PageFetcher;
use crate::models::MediaFormat;
use tracing::{debug, instrument, warn};
use url::Url;

/// Options shared by every format built from one manifest.
#[derive(Debug, Clone, Copy)]
pub struct HlsOptions<'a> {
    /// Container extension for the formats, e.g. `mp4`.
    pub ext: &'a str,
    /// Download protocol hint, e.g. `m3u8_native`.
    pub protocol: &'a str,
    /// Prefix for generated format identifiers.
    pub m3u8_id: &'a str,
}

/// Fetch and parse an HLS manifest without failing the extraction.
///
/// Fetch errors and unparsable manifests are logged and produce an empty list.
#[instrument(level = "info", skip_all, fields(%video_id))]
pub async fn extract_m3u8_formats<F: PageFetcher>(
    fetcher: &F,
    manifest_url: &str,
    video_id: &str,
    options: HlsOptions<'_>,
) -> Vec<MediaFormat> {
    match fetcher.fetch_text(manifest_url, video_id).await {
        Ok(text) => {
            let formats = parse_m3u8_formats(&text, manifest_url, options);
            debug!(count = formats.len(), "Parsed HLS manifest");
            formats
        }
        Err(e) => {
            warn!(error = %e, "Failed to download m3u8 information");
            Vec::new()
        }
    }
}

/// Parse manifest `text` fetched from `manifest_url`.
pub fn parse_m3u8_formats(text: &str, manifest_url: &str, options: HlsOptions<'_>) -> Vec<MediaFormat> {
    let text = text.trim_start_matches('\u{feff}');
    if !text.trim_start().starts_with("#EXTM3U") {
        return Vec::new();
    }
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let is_master = lines.iter().any(|l| l.starts_with("#EXT-X-STREAM-INF"));
    if !is_master {
        if lines.iter().any(|l| l.starts_with("#EXTINF")) {
            return vec![MediaFormat {
                url: manifest_url.to_string(),
                format_id: Some(options.m3u8_id.to_string()),
                ext: options.ext.to_string(),
                protocol: Some(options.protocol.to_string()),
                ..Default::default()
            }];
        }
        return Vec::new();
    }

    let base = Url::parse(manifest_url).ok();
    let mut formats = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(attrs) = lines[i].strip_prefix("#EXT-X-STREAM-INF:") else {
            i += 1;
            continue;
        };

        // A variant without a URI line must not borrow the next variant's.
        let mut j = i + 1;
        while j < lines.len() && lines[j].starts_with('#') && !lines[j].starts_with("#EXT-X-STREAM-INF") {
            j += 1;
        }
        match lines.get(j) {
            Some(line) if !line.starts_with('#') => {
                if let Some(url) = resolve_url(base.as_ref(), line) {
                    formats.push(variant_format(attrs, url, formats.len(), options));
                }
                i = j + 1;
            }
            _ => i = j,
        }
    }
    formats
}

fn variant_format(attrs: &str, url: String, index: usize, options: HlsOptions<'_>) -> MediaFormat {
    let tbr = attr(attrs, "AVERAGE-BANDWIDTH")
        .or_else(|| attr(attrs, "BANDWIDTH"))
        .and_then(|b| b.parse::<u64>().ok())
        .map(|bps| bps / 1000)
        .filter(|kbps| *kbps > 0);
    let (width, height) = attr(attrs, "RESOLUTION")
        .and_then(|r| {
            let (w, h) = r.split_once(['x', 'X'])?;
            Some((w.parse::<u64>().ok()?, h.parse::<u64>().ok()?))
        })
        .map_or((None, None), |(w, h)| (Some(w), Some(h)));
    let fps = attr(attrs, "FRAME-RATE").and_then(|f| f.parse::<f64>().ok());
    let (vcodec, acodec) = attr(attrs, "CODECS")
        .map(|codecs| split_codecs(&codecs))
        .unwrap_or((None, None));

    let suffix = tbr.map(|t| t.to_string()).unwrap_or_else(|| index.to_string());
    MediaFormat {
        url,
        format_id: Some(format!("{}-{}", options.m3u8_id, suffix)),
        ext: options.ext.to_string(),
        protocol: Some(options.protocol.to_string()),
        vcodec,
        acodec,
        width,
        height,
        tbr,
        fps,
        ..Default::default()
    }
}

/// Read a value from an M3U8 attribute list, unquoting quoted strings.
fn attr(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    while !rest.is_empty() {
        let (key, after) = rest.split_once('=')?;
        let (value, next) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted.find('"')?;
            let tail = &quoted[end + 1..];
            (&quoted[..end], tail.strip_prefix(',').unwrap_or(tail))
        } else {
            match after.split_once(',') {
                Some((v, tail)) => (v, tail),
                None => (after, ""),
            }
        };
        if key.trim() == name {
            return Some(value.to_string());
        }
        rest = next;
    }
    None
}

fn split_codecs(codecs: &str) -> (Option<String>, Option<String>) {
    let mut vcodec = None;
    let mut acodec = None;
    for codec in codecs.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let family = codec.split('.').next().unwrap_or(codec);
        match family {
            "avc1" | "avc3" | "hvc1" | "hev1" | "dvh1" | "vp09" | "vp9" | "av01" | "mp4v" => {
                vcodec.get_or_insert_with(|| codec.to_string());
            }
            "mp4a" | "ac-3" | "ec-3" | "opus" | "flac" => {
                acodec.get_or_insert_with(|| codec.to_string());
            }
            _ => {}
        }
    }
    match (vcodec, acodec) {
        (None, Some(a)) => (Some("none".to_string()), Some(a)),
        other => other,
    }
}

fn resolve_url(base: Option<&Url>, reference: &str) -> Option<String> {
    match Url::parse(reference) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => base?.join(reference).ok().map(|u| u.to_string()),
    }
}
