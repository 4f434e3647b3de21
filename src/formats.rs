//! Quality ranking for extracted formats.

use crate::models::MediaFormat;
use std::cmp::Ordering;

/// Sort formats from worst to best, best last.
///
/// Ranking keys in order: has video, height, width, total bitrate,
/// filesize, frame rate. Missing values rank below any known value and
/// ties keep their original order.
pub fn sort_formats(formats: &mut [MediaFormat]) {
    formats.sort_by(compare_quality);
}

fn compare_quality(a: &MediaFormat, b: &MediaFormat) -> Ordering {
    a.has_video()
        .cmp(&b.has_video())
        .then(a.height.cmp(&b.height))
        .then(a.width.cmp(&b.width))
        .then(a.tbr.cmp(&b.tbr))
        .then(a.filesize.cmp(&b.filesize))
        .then(a.fps.partial_cmp(&b.fps).unwrap_or(Ordering::Equal))
}
