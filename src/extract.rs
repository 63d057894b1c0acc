//! Per-format metadata extraction.
//!
//! Each extractor is a pure function from a file path to a canonical
//! footprint. Files are opened, read and closed within the call. Failures
//! are returned as [`ExtractError`] so the builder can skip the file and
//! carry on with the batch.

pub mod gpx;
pub mod image;
pub mod video;

use crate::models::GeoPoint;

/// Extraction error. The caller logs it and skips the file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPX parse failed: {0}")]
    Gpx(String),
    #[error("EXIF read failed: {0}")]
    Exif(String),
    #[error("video container parse failed: {0}")]
    Video(String),
}

/// Footprint of a single-instant artifact (photo or video).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaMetadata {
    pub timestamp: Option<i64>,
    pub location: Option<GeoPoint>,
}
