//! Info JSON output for extraction results.
//!
//! Each successful extraction is written to `<output_dir>/<id>.info.json`,
//! or printed to stdout when no directory is given.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 6880080.info.json
//! └── ZW0898A003S00.info.json
//! ```

use crate::models::Extraction;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize an [`Extraction`] to JSON.
pub fn to_json(extraction: &Extraction, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(extraction)
    } else {
        serde_json::to_string(extraction)
    }
}

/// File name for an extraction; playlists without an id fall back to `fallback`.
pub fn info_json_filename(extraction: &Extraction, fallback: &str) -> String {
    let id = extraction.id().unwrap_or(fallback);
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}.info.json")
}

/// Write an [`Extraction`] as `<output_dir>/<id>.info.json`.
///
/// Creates the directory if needed.
///
/// # Returns
///
/// The path written to, or an error if directory creation or writing fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_info_json(
    extraction: &Extraction,
    output_dir: &Path,
    fallback_id: &str,
    pretty: bool,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = to_json(extraction, pretty)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = output_dir.join(info_json_filename(extraction, fallback_id));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote info JSON");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaRecord, PlaylistRecord};

    fn media() -> Extraction {
        Extraction::Media(MediaRecord {
            id: "6880080".to_string(),
            title: "NAB lifts interest rates, following Westpac and CBA".to_string(),
            extractor: "abc.net.au".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_info_json_filename() {
        assert_eq!(info_json_filename(&media(), "x"), "6880080.info.json");

        let playlist = Extraction::Playlist(PlaylistRecord {
            id: None,
            entries: vec![],
            extractor: "abc.net.au".to_string(),
        });
        assert_eq!(info_json_filename(&playlist, "a/b?c"), "a_b_c.info.json");
    }

    #[tokio::test]
    async fn test_write_info_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let path = write_info_json(&media(), &out, "unused", true).await.unwrap();

        assert_eq!(path, out.join("6880080.info.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["id"], "6880080");
        assert_eq!(value["_type"], "video");
    }
}
