//! EXIF capture time and GPS position.

use chrono::{FixedOffset, NaiveDateTime};
use exif::{Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{ExtractError, MediaMetadata};
use crate::models::GeoPoint;

/// Read capture time and location from a photo's EXIF block.
///
/// EXIF times carry no zone, so they are interpreted in `offset`. A photo
/// without any EXIF block, or in a format that cannot carry one, yields
/// empty metadata rather than an error.
pub fn read_image_metadata(
    path: &Path,
    offset: &FixedOffset,
) -> Result<MediaMetadata, ExtractError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        // formats without an EXIF container (GIF, BMP) land here too
        Err(exif::Error::NotFound(_) | exif::Error::InvalidFormat(_)) => {
            return Ok(MediaMetadata::default())
        }
        Err(e) => return Err(ExtractError::Exif(e.to_string())),
    };

    Ok(MediaMetadata {
        timestamp: capture_time(&exif, offset),
        location: gps_location(&exif),
    })
}

fn capture_time(exif: &Exif, offset: &FixedOffset) -> Option<i64> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| ascii_field(exif, tag))
        .find_map(|s| parse_exif_datetime(&s, offset))
}

pub fn parse_exif_datetime(s: &str, offset: &FixedOffset) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    naive
        .and_local_timezone(*offset)
        .single()
        .map(|dt| dt.timestamp())
}

fn gps_location(exif: &Exif) -> Option<GeoPoint> {
    let latitude = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S")?;
    let longitude = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W")?;
    Some(GeoPoint::new(latitude, longitude))
}

fn gps_coordinate(exif: &Exif, coord_tag: Tag, ref_tag: Tag, negative_ref: &str) -> Option<f64> {
    let field = exif.get_field(coord_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    let dms: Vec<f64> = parts.iter().map(|r| r.to_f64()).collect();
    let reference = ascii_field(exif, ref_tag).unwrap_or_default();
    dms_to_decimal(&dms, &reference, negative_ref)
}

/// Degrees/minutes/seconds to signed decimal degrees.
pub fn dms_to_decimal(dms: &[f64], reference: &str, negative_ref: &str) -> Option<f64> {
    let degrees = *dms.first()?;
    let minutes = dms.get(1).copied().unwrap_or(0.0);
    let seconds = dms.get(2).copied().unwrap_or(0.0);
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if !decimal.is_finite() {
        return None;
    }
    if reference.trim().eq_ignore_ascii_case(negative_ref) {
        Some(-decimal)
    } else {
        Some(decimal)
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).trim_end_matches('\0').to_string()),
        _ => None,
    }
}
