//! Utility functions for value coercion, URL manipulation and time parsing.
//!
//! This module provides the small helpers both extractors lean on:
//! - Lenient integer coercion for loosely typed embedded JSON
//! - Extension guessing from media URLs
//! - ISO-8601 timestamp parsing with a configurable date/time delimiter
//! - Query parameter injection for signed stream URLs
//! - String truncation for logging

use chrono::{NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

static FRACTIONAL_SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[0-9]+").unwrap());

static TIMEZONE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.{8,}?(?P<tz>Z$| ?(?P<sign>\+|-)(?P<hours>[0-9]{2}):?(?P<minutes>[0-9]{2})$)")
        .unwrap()
});

/// Current time as unix seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Coerce a JSON value to a non-negative integer, `None` when impossible.
///
/// Numbers are truncated toward zero; strings must hold a plain integer.
/// Missing, null, empty or unparsable values never raise an error.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(int_or_none(Some(&json!("1280"))), Some(1280));
/// assert_eq!(int_or_none(Some(&json!(128.9))), Some(128));
/// assert_eq!(int_or_none(Some(&json!("n/a"))), None);
/// ```
pub fn int_or_none(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64)),
        Value::String(s) => str_to_int(s),
        _ => None,
    }
}

/// Parse a trimmed string as a non-negative integer.
pub fn str_to_int(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

/// Guess a file extension from the last path segment of a URL.
///
/// Returns `default` when the URL has no alphanumeric extension.
pub fn determine_ext(url: &str, default: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => default.to_string(),
    }
}

/// Parse an ISO-8601 date-time into unix seconds.
///
/// `delimiter` separates the date and time parts (`'T'` for strict
/// ISO-8601, `' '` for the common `YYYY-MM-DD HH:MM:SS` variant).
/// Fractional seconds are dropped. A trailing `Z` or `±HH:MM` offset is
/// honoured; without one the time is taken as UTC.
pub fn parse_iso8601(date_str: Option<&str>, delimiter: char) -> Option<i64> {
    let date_str = date_str?.trim();
    if date_str.is_empty() {
        return None;
    }
    let stripped = FRACTIONAL_SECONDS.replace(date_str, "");

    let (offset_secs, local) = match TIMEZONE_SUFFIX.captures(&stripped) {
        Some(caps) => {
            let tz = caps.name("tz")?;
            let offset = match caps.name("sign") {
                Some(sign) => {
                    let hours: i64 = caps["hours"].parse().ok()?;
                    let minutes: i64 = caps["minutes"].parse().ok()?;
                    let secs = hours * 3600 + minutes * 60;
                    if sign.as_str() == "-" { -secs } else { secs }
                }
                None => 0,
            };
            (offset, &stripped[..tz.start()])
        }
        None => (0, &stripped[..]),
    };

    let format = format!("%Y-%m-%d{delimiter}%H:%M:%S");
    let naive = NaiveDateTime::parse_from_str(local, &format).ok()?;
    Some(naive.and_utc().timestamp() - offset_secs)
}

/// Set query parameters on a URL, replacing any existing values for the
/// same keys and keeping the rest in order.
pub fn update_url_query(url: &str, params: &[(&str, &str)]) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !params.iter().any(|(name, _)| name == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        pairs.extend_pairs(params.iter().copied());
    }
    Ok(parsed.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let result = truncate_for_log("ééééé", 2);
        assert_eq!(result, "éé…(+6 bytes)");
    }

    #[test]
    fn test_int_or_none() {
        assert_eq!(int_or_none(Some(&json!(1280))), Some(1280));
        assert_eq!(int_or_none(Some(&json!("720"))), Some(720));
        assert_eq!(int_or_none(Some(&json!(" 64 "))), Some(64));
        assert_eq!(int_or_none(Some(&json!(128.9))), Some(128));
        assert_eq!(int_or_none(Some(&json!(""))), None);
        assert_eq!(int_or_none(Some(&json!("1.5"))), None);
        assert_eq!(int_or_none(Some(&json!(null))), None);
        assert_eq!(int_or_none(Some(&json!(-5))), None);
        assert_eq!(int_or_none(None), None);
    }

    #[test]
    fn test_determine_ext() {
        assert_eq!(
            determine_ext("http://mpegmedia.abc.net.au/news/audio/201510/nab.mp3", "mp4"),
            "mp3"
        );
        assert_eq!(determine_ext("http://example.com/video.MP4?x=1#t", "flv"), "mp4");
        assert_eq!(determine_ext("http://example.com/stream", "mp4"), "mp4");
        assert_eq!(determine_ext("http://example.com/dir.v2/stream", "mp4"), "mp4");
    }

    #[test]
    fn test_parse_iso8601_space_delimited() {
        assert_eq!(
            parse_iso8601(Some("2017-12-28 22:13:07"), ' '),
            Some(1514499187)
        );
    }

    #[test]
    fn test_parse_iso8601_with_offset_and_fraction() {
        assert_eq!(
            parse_iso8601(Some("2017-12-29T09:13:07.123+11:00"), 'T'),
            Some(1514499187)
        );
        assert_eq!(
            parse_iso8601(Some("2017-12-28T22:13:07Z"), 'T'),
            Some(1514499187)
        );
    }

    #[test]
    fn test_parse_iso8601_invalid() {
        assert_eq!(parse_iso8601(None, ' '), None);
        assert_eq!(parse_iso8601(Some(""), ' '), None);
        assert_eq!(parse_iso8601(Some("yesterday"), ' '), None);
        assert_eq!(parse_iso8601(Some("2017-12-28T22:13:07"), ' '), None);
    }

    #[test]
    fn test_update_url_query_appends_and_replaces() {
        let url = update_url_query(
            "https://example.com/master.m3u8?a=1&hdnea=old",
            &[("hdnea", "exp=1~acl=/*")],
        )
        .unwrap();
        assert!(url.starts_with("https://example.com/master.m3u8?a=1&hdnea="));
        assert!(!url.contains("old"));

        let parsed = Url::parse(&url).unwrap();
        let token = parsed
            .query_pairs()
            .find(|(k, _)| k == "hdnea")
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("exp=1~acl=/*"));
    }

    #[test]
    fn test_update_url_query_rejects_relative() {
        assert!(update_url_query("/relative/path", &[("a", "b")]).is_err());
    }
}
