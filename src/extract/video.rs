//! QuickTime / ISO-BMFF container metadata.
//!
//! Reads the `moov` box and looks for the Apple metadata keys
//! `com.apple.quicktime.creationdate` and
//! `com.apple.quicktime.location.ISO6709` (`moov/meta` keys + ilst), falling
//! back to `udta/©xyz` for the location and `mvhd` for the creation time.

use chrono::DateTime;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::{ExtractError, MediaMetadata};
use crate::models::GeoPoint;

const KEY_CREATION_DATE: &str = "com.apple.quicktime.creationdate";
const KEY_LOCATION: &str = "com.apple.quicktime.location.ISO6709";

/// Upper bound on the `moov` box we are willing to load.
const MAX_MOOV_BYTES: u64 = 64 * 1024 * 1024;
/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;
const XYZ: [u8; 4] = [0xA9, b'x', b'y', b'z'];

pub fn read_video_metadata(path: &Path) -> Result<MediaMetadata, ExtractError> {
    let mut file = File::open(path)?;
    let moov = read_moov(&mut file)?
        .ok_or_else(|| ExtractError::Video("no moov box found".to_string()))?;
    Ok(parse_moov(&moov))
}

/// Walk top-level boxes and return the body of `moov`, skipping `mdat`
/// and anything else by seeking.
fn read_moov<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<u8>>, ExtractError> {
    let len = reader.seek(SeekFrom::End(0))?;
    let mut pos = 0u64;

    while pos + 8 <= len {
        reader.seek(SeekFrom::Start(pos))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let fourcc = [header[4], header[5], header[6], header[7]];

        let (box_size, header_len) = match size32 {
            0 => (len - pos, 8),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (u64::from_be_bytes(large), 16)
            }
            n => (n as u64, 8),
        };
        let end = match pos.checked_add(box_size) {
            Some(end) if box_size >= header_len && end <= len => end,
            _ => {
                return Err(ExtractError::Video(format!(
                    "invalid box size {} at offset {}",
                    box_size, pos
                )))
            }
        };

        if &fourcc == b"moov" {
            let body_len = box_size - header_len;
            if body_len > MAX_MOOV_BYTES {
                return Err(ExtractError::Video(format!(
                    "moov box too large ({} bytes)",
                    body_len
                )));
            }
            let mut body = vec![0u8; body_len as usize];
            reader.read_exact(&mut body)?;
            return Ok(Some(body));
        }

        pos = end;
    }

    Ok(None)
}

/// Iterator over the child boxes packed in a byte slice.
struct Boxes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Boxes<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for Boxes<'a> {
    type Item = ([u8; 4], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.len() < 8 {
            return None;
        }
        let size32 = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let fourcc = [rest[4], rest[5], rest[6], rest[7]];
        let (size, header_len) = match size32 {
            0 => (rest.len(), 8),
            1 => {
                let large: [u8; 8] = rest.get(8..16)?.try_into().ok()?;
                (usize::try_from(u64::from_be_bytes(large)).ok()?, 16)
            }
            n => (n as usize, 8),
        };
        if size < header_len || size > rest.len() {
            return None;
        }
        self.pos += size;
        Some((fourcc, &rest[header_len..size]))
    }
}

fn find_box<'a>(data: &'a [u8], fourcc: &[u8; 4]) -> Option<&'a [u8]> {
    Boxes::new(data)
        .find(|(t, _)| t == fourcc)
        .map(|(_, body)| body)
}

fn parse_moov(moov: &[u8]) -> MediaMetadata {
    let udta = find_box(moov, b"udta");

    let mut entries = Vec::new();
    if let Some(meta) = find_box(moov, b"meta") {
        entries.extend(metadata_entries(meta));
    }
    if let Some(meta) = udta.and_then(|u| find_box(u, b"meta")) {
        entries.extend(metadata_entries(meta));
    }
    let lookup = |key: &str| {
        entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    };

    let timestamp = lookup(KEY_CREATION_DATE)
        .and_then(parse_creation_date)
        .or_else(|| find_box(moov, b"mvhd").and_then(mvhd_creation_time));

    let location = lookup(KEY_LOCATION)
        .and_then(parse_iso6709)
        .or_else(|| {
            udta.and_then(|u| find_box(u, &XYZ))
                .and_then(xyz_string)
                .as_deref()
                .and_then(parse_iso6709)
        })
        .map(|(point, _altitude)| point);

    MediaMetadata {
        timestamp,
        location,
    }
}

/// Resolve `ilst` items against the `keys` table of a `meta` box.
fn metadata_entries(meta: &[u8]) -> Vec<(String, String)> {
    // QuickTime `meta` has no version/flags; the ISO full-box form does.
    let children = if meta.get(4..8) == Some(b"hdlr".as_slice()) {
        meta
    } else {
        meta.get(4..).unwrap_or_default()
    };

    let keys = find_box(children, b"keys").map(parse_keys).unwrap_or_default();
    let Some(ilst) = find_box(children, b"ilst") else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (index, item) in Boxes::new(ilst) {
        let index = u32::from_be_bytes(index) as usize;
        let Some(key) = index.checked_sub(1).and_then(|i| keys.get(i)) else {
            continue;
        };
        // data box: 4 bytes type indicator, 4 bytes locale, then the value
        let Some(value) = find_box(item, b"data").and_then(|d| d.get(8..)) else {
            continue;
        };
        entries.push((key.clone(), String::from_utf8_lossy(value).into_owned()));
    }
    entries
}

fn parse_keys(keys: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let Some(count) = keys.get(4..8) else {
        return out;
    };
    let count = u32::from_be_bytes([count[0], count[1], count[2], count[3]]);
    let mut pos = 8usize;
    for _ in 0..count {
        let Some(size) = keys.get(pos..pos + 4) else {
            break;
        };
        let size = u32::from_be_bytes([size[0], size[1], size[2], size[3]]) as usize;
        // size covers itself and the 4-byte namespace
        let Some(name) = size.checked_sub(8).and_then(|n| keys.get(pos + 8..pos + 8 + n)) else {
            break;
        };
        out.push(String::from_utf8_lossy(name).into_owned());
        pos += size;
    }
    out
}

fn mvhd_creation_time(mvhd: &[u8]) -> Option<i64> {
    let seconds = match mvhd.first()? {
        0 => u32::from_be_bytes(mvhd.get(4..8)?.try_into().ok()?) as i64,
        1 => i64::try_from(u64::from_be_bytes(mvhd.get(4..12)?.try_into().ok()?)).ok()?,
        _ => return None,
    };
    (seconds > 0).then(|| seconds - QUICKTIME_EPOCH_OFFSET)
}

/// `©xyz` payload: 2-byte length, 2-byte language code, then the string.
fn xyz_string(body: &[u8]) -> Option<String> {
    let len = u16::from_be_bytes([*body.first()?, *body.get(1)?]) as usize;
    let text = body.get(4..4 + len)?;
    Some(String::from_utf8_lossy(text).into_owned())
}

/// Apple writes e.g. `2025-06-17T08:45:03-0700`.
pub fn parse_creation_date(s: &str) -> Option<i64> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.timestamp())
}

/// Parse `±DD.DDDD±DDD.DDDD[±DDD.DDD]/` into a point and optional altitude.
///
/// Only the leading latitude and longitude are required; anything after
/// the altitude (a `CRS` suffix, extra components) is ignored.
pub fn parse_iso6709(s: &str) -> Option<(GeoPoint, Option<f64>)> {
    let (latitude, rest) = signed_decimal(s.trim())?;
    let (longitude, rest) = signed_decimal(rest)?;
    let altitude = signed_decimal(rest).map(|(alt, _)| alt);
    Some((GeoPoint::new(latitude, longitude), altitude))
}

/// Split a leading `±digits[.digits]` off `s`.
fn signed_decimal(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    if !matches!(bytes.first(), Some(b'+' | b'-')) {
        return None;
    }
    let int_end = 1 + bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
    if int_end == 1 {
        return None;
    }
    let mut end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if frac > 0 {
            end += 1 + frac;
        }
    }
    let value = s[..end].parse::<f64>().ok()?;
    Some((value, &s[end..]))
}
