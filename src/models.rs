//! Core data models used throughout the travelogue pipeline.
//!
//! These types represent the files discovered on disk and the artifacts
//! extracted from them. Artifacts are immutable value records once built;
//! the [`Travelogue`](crate::travelogue::Travelogue) owns them afterwards.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A regular file found by the walker, before classification.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: String,
}

/// The kind of source file an artifact was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Gpx,
    Image,
    Video,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Gpx => "gpx",
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// GeoJSON position order: `[longitude, latitude]`.
    pub fn to_position(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Two independently optional corners.
///
/// For GPX artifacts these are the path endpoints (first and last track
/// point), not a bounding box. For photos and videos both corners hold the
/// same point. `None` means "location unknown" and is never `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeoBounds {
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

impl GeoBounds {
    pub fn new(start: Option<GeoPoint>, end: Option<GeoPoint>) -> Self {
        Self { start, end }
    }

    /// Degenerate bounds for a single-location artifact.
    pub fn point(location: Option<GeoPoint>) -> Self {
        Self {
            start: location,
            end: location,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Unix timestamps (seconds) bounding an artifact in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeBounds {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeBounds {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn instant(ts: Option<i64>) -> Self {
        Self { start: ts, end: ts }
    }
}

/// One source file's temporal and geospatial footprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub size: Option<u64>,
    pub time_bounds: TimeBounds,
    pub geo_bounds: GeoBounds,
}

impl Artifact {
    /// Timestamp used for ordering within a day.
    pub fn timestamp(&self) -> Option<i64> {
        self.time_bounds.start
    }

    /// Calendar date of the start timestamp in the reference offset.
    pub fn day_key(&self, offset: &FixedOffset) -> Option<NaiveDate> {
        self.time_bounds
            .start
            .and_then(|ts| local_datetime(ts, offset))
            .map(|dt| dt.date_naive())
    }

    /// One-line description used by the summary.
    pub fn describe(&self, offset: &FixedOffset) -> String {
        let when = self
            .time_bounds
            .start
            .and_then(|ts| local_datetime(ts, offset))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        let place = match self.geo_bounds.start {
            Some(p) => format!("({:.5}, {:.5})", p.latitude, p.longitude),
            None => "unknown location".to_string(),
        };
        format!("{} {} {} {}", when, self.kind, place, self.path.display())
    }
}

/// Convert a unix timestamp to a datetime in the given offset.
pub fn local_datetime(ts: i64, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(offset))
}
