//! Pipeline orchestration.
//!
//! Coordinates the batch flow: walk → classify → extract → artifact →
//! travelogue. Per-file failures are logged and skipped; only an invalid
//! input root aborts the run.

use anyhow::Result;
use chrono::FixedOffset;
use tracing::{debug, info, warn};

use crate::classify::{classify, FileKind};
use crate::config::Config;
use crate::extract::gpx::summarize_gpx;
use crate::extract::image::read_image_metadata;
use crate::extract::video::read_video_metadata;
use crate::extract::{ExtractError, MediaMetadata};
use crate::models::{Artifact, ArtifactKind, FileRecord, GeoBounds, TimeBounds};
use crate::travelogue::Travelogue;
use crate::walker;

/// Counters reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub scanned: usize,
    pub inserted: usize,
    pub unsupported: usize,
    pub failed: usize,
}

/// Build an artifact from one file.
///
/// Returns `Ok(None)` for unsupported files.
pub fn build_artifact(
    record: &FileRecord,
    offset: &FixedOffset,
) -> Result<Option<Artifact>, ExtractError> {
    let artifact = match classify(&record.path, &record.mime_type) {
        FileKind::Gpx => {
            let summary = summarize_gpx(&record.path)?;
            Artifact {
                path: record.path.clone(),
                kind: ArtifactKind::Gpx,
                size: Some(record.size),
                time_bounds: TimeBounds::new(summary.time_start, summary.time_end),
                geo_bounds: GeoBounds::new(summary.geo_start, summary.geo_end),
            }
        }
        FileKind::Image => {
            let meta = read_image_metadata(&record.path, offset)?;
            media_artifact(record, ArtifactKind::Image, meta)
        }
        FileKind::Video => {
            let meta = read_video_metadata(&record.path)?;
            media_artifact(record, ArtifactKind::Video, meta)
        }
        FileKind::Unsupported => return Ok(None),
    };
    Ok(Some(artifact))
}

fn media_artifact(record: &FileRecord, kind: ArtifactKind, meta: MediaMetadata) -> Artifact {
    Artifact {
        path: record.path.clone(),
        kind,
        size: Some(record.size),
        time_bounds: TimeBounds::instant(meta.timestamp),
        geo_bounds: GeoBounds::point(meta.location),
    }
}

/// Insert every buildable record into a fresh travelogue, then sort it.
pub fn assemble(records: &[FileRecord], offset: FixedOffset) -> (Travelogue, BuildStats) {
    let mut travelogue = Travelogue::new(offset);
    let mut stats = BuildStats {
        scanned: records.len(),
        ..BuildStats::default()
    };

    for record in records {
        match build_artifact(record, &offset) {
            Ok(Some(artifact)) => {
                debug!(
                    path = %record.path.display(),
                    kind = %artifact.kind,
                    "built artifact"
                );
                travelogue.insert(artifact);
                stats.inserted += 1;
            }
            Ok(None) => {
                info!(
                    "Unsupported file type: {} for {}",
                    record.mime_type,
                    record.path.display()
                );
                stats.unsupported += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {}", record.path.display(), e);
                stats.failed += 1;
            }
        }
    }

    travelogue.sort_days();
    (travelogue, stats)
}

/// Walk the configured root and assemble the travelogue.
pub fn build_travelogue(config: &Config) -> Result<(Travelogue, BuildStats)> {
    let offset = config.reference_offset()?;
    let records = walker::scan_directory(&config.input)?;
    info!(
        "Scanned {} files under {}",
        records.len(),
        config.input.root.display()
    );
    Ok(assemble(&records, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{MIME_OCTET_STREAM, MIME_TEXT_XML};
    use crate::extract::image::tests::{jpeg_with_exif, GIF};
    use crate::extract::video::tests::quicktime_with_metadata;
    use crate::models::GeoPoint;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn record(path: &Path, mime: &str) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            size: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn gpx_artifact_has_endpoint_bounds() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("walk.gpx");
        fs::write(
            &path,
            r#"<?xml version="1.0"?><gpx><trk><trkseg>
<trkpt lat="1" lon="2"><time>2025-06-17T08:00:00Z</time></trkpt>
<trkpt lat="3" lon="4"><time>2025-06-17T09:00:00Z</time></trkpt>
<trkpt lat="5" lon="6"><time>2025-06-17T10:00:00Z</time></trkpt>
</trkseg></trk></gpx>"#,
        )
        .unwrap();

        let artifact = build_artifact(&record(&path, MIME_TEXT_XML), &utc())
            .unwrap()
            .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Gpx);
        assert_eq!(artifact.geo_bounds.start, Some(GeoPoint::new(1.0, 2.0)));
        assert_eq!(artifact.geo_bounds.end, Some(GeoPoint::new(5.0, 6.0)));
        assert_eq!(artifact.time_bounds.start, Some(1_750_147_200));
        assert_eq!(artifact.time_bounds.end, Some(1_750_154_400));
    }

    #[test]
    fn image_without_gps_has_unknown_bounds() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        fs::write(&path, jpeg_with_exif("2025:06:17 08:45:03", None)).unwrap();

        let artifact = build_artifact(&record(&path, "image/jpeg"), &utc())
            .unwrap()
            .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Image);
        assert!(artifact.geo_bounds.is_unknown());
        assert_eq!(artifact.size, Some(fs::metadata(&path).unwrap().len()));
        assert_eq!(artifact.time_bounds.start, artifact.time_bounds.end);
    }

    #[test]
    fn gif_becomes_undated_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("anim.gif");
        fs::write(&path, GIF).unwrap();

        let mime = crate::classify::sniff_mime(&path);
        assert_eq!(mime, "image/gif");
        let artifact = build_artifact(&record(&path, &mime), &utc())
            .unwrap()
            .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Image);
        assert_eq!(artifact.timestamp(), None);
        assert!(artifact.geo_bounds.is_unknown());
    }

    #[test]
    fn video_is_sniffed_and_located() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("IMG_0042.MOV");
        fs::write(
            &path,
            quicktime_with_metadata("2025-06-17T08:45:03-0700", "-33.8688+151.2093/"),
        )
        .unwrap();

        let mime = crate::classify::sniff_mime(&path);
        assert!(mime.starts_with("video/"), "sniffed {}", mime);
        let artifact = build_artifact(&record(&path, &mime), &utc())
            .unwrap()
            .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Video);
        assert_eq!(artifact.timestamp(), Some(1_750_175_103));
        assert_eq!(
            artifact.geo_bounds.start,
            Some(GeoPoint::new(-33.8688, 151.2093))
        );
    }

    #[test]
    fn unsupported_returns_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();
        assert!(build_artifact(&record(&path, MIME_OCTET_STREAM), &utc())
            .unwrap()
            .is_none());
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let bad_video = tmp.path().join("broken.mov");
        fs::write(&bad_video, b"not a container").unwrap();
        let good = tmp.path().join("photo.jpg");
        fs::write(&good, jpeg_with_exif("2025:06:17 08:45:03", None)).unwrap();
        let text = tmp.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();

        let records = vec![
            record(&bad_video, "video/quicktime"),
            record(&good, "image/jpeg"),
            record(&text, MIME_OCTET_STREAM),
        ];
        let (travelogue, stats) = assemble(&records, utc());
        assert_eq!(
            stats,
            BuildStats {
                scanned: 3,
                inserted: 1,
                unsupported: 1,
                failed: 1,
            }
        );
        assert_eq!(travelogue.artifact_count(), 1);
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.input.root = tmp.path().join("missing");
        assert!(build_travelogue(&config).is_err());
    }
}
