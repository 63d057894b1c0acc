//! GPX track parsing.
//!
//! Only tracks are read; routes and waypoints are ignored. The summary's
//! geo corners are the path endpoints (first point of the first segment of
//! the first track, last point of the last segment of the last track), and
//! its time bounds are the first and last timed points in file order.

use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::ExtractError;
use crate::models::GeoPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct GpxPoint {
    pub location: GeoPoint,
    pub time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GpxSegment {
    pub points: Vec<GpxPoint>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub segments: Vec<GpxSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpxSummary {
    pub time_start: Option<i64>,
    pub time_end: Option<i64>,
    pub geo_start: Option<GeoPoint>,
    pub geo_end: Option<GeoPoint>,
}

pub fn read_tracks(path: &Path) -> Result<Vec<GpxTrack>, ExtractError> {
    let file = File::open(path)?;
    parse_tracks(BufReader::new(file))
}

pub fn summarize_gpx(path: &Path) -> Result<GpxSummary, ExtractError> {
    Ok(summarize_tracks(&read_tracks(path)?))
}

pub fn summarize_tracks(tracks: &[GpxTrack]) -> GpxSummary {
    // first and last timed point in document order, not min/max
    let mut times = tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|s| s.points.iter())
        .filter_map(|p| p.time);
    let time_start = times.next();
    let time_end = times.last().or(time_start);

    let geo_start = tracks
        .first()
        .and_then(|t| t.segments.first())
        .and_then(|s| s.points.first())
        .map(|p| p.location);
    let geo_end = tracks
        .last()
        .and_then(|t| t.segments.last())
        .and_then(|s| s.points.last())
        .map(|p| p.location);

    GpxSummary {
        time_start,
        time_end,
        geo_start,
        geo_end,
    }
}

pub fn parse_tracks<R: BufRead>(source: R) -> Result<Vec<GpxTrack>, ExtractError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut text_buf = Vec::new();

    let mut tracks = Vec::new();
    let mut track: Option<GpxTrack> = None;
    let mut segment: Option<GpxSegment> = None;
    let mut point: Option<GpxPoint> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"trk" => track = Some(GpxTrack::default()),
                    b"trkseg" if track.is_some() => segment = Some(GpxSegment::default()),
                    b"trkpt" if segment.is_some() => point = parse_trkpt(&e),
                    b"time" => {
                        if let Some(p) = point.as_mut() {
                            p.time = read_text(&mut reader, &mut text_buf)?
                                .as_deref()
                                .and_then(parse_time);
                        }
                    }
                    b"name" if segment.is_none() => {
                        if let Some(t) = track.as_mut() {
                            t.name = read_text(&mut reader, &mut text_buf)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"trk" => tracks.push(GpxTrack::default()),
                    b"trkseg" => {
                        if let Some(t) = track.as_mut() {
                            t.segments.push(GpxSegment::default());
                        }
                    }
                    b"trkpt" => {
                        if let (Some(s), Some(p)) = (segment.as_mut(), parse_trkpt(&e)) {
                            s.points.push(p);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let (Some(s), Some(p)) = (segment.as_mut(), point.take()) {
                        s.points.push(p);
                    }
                }
                b"trkseg" => {
                    if let (Some(t), Some(s)) = (track.as_mut(), segment.take()) {
                        t.segments.push(s);
                    }
                }
                b"trk" => {
                    if let Some(t) = track.take() {
                        tracks.push(t);
                    }
                }
                _ => {}
            },
            Err(e) => {
                return Err(ExtractError::Gpx(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(tracks)
}

/// A `<trkpt>` without parseable `lat`/`lon` attributes is dropped.
fn parse_trkpt(e: &BytesStart) -> Option<GpxPoint> {
    let mut lat = None;
    let mut lon = None;
    for a in e.attributes().flatten() {
        let value = std::str::from_utf8(&a.value)
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok());
        match a.key.local_name().as_ref() {
            b"lat" => lat = value,
            b"lon" => lon = value,
            _ => {}
        }
    }
    Some(GpxPoint {
        location: GeoPoint::new(lat?, lon?),
        time: None,
    })
}

fn read_text<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
) -> Result<Option<String>, ExtractError> {
    buf.clear();
    let text = match reader.read_event_into(buf) {
        Ok(Event::Text(t)) => Some(
            t.unescape()
                .map_err(|e| ExtractError::Gpx(e.to_string()))?
                .into_owned(),
        ),
        Ok(Event::CData(c)) => Some(String::from_utf8_lossy(&c).into_owned()),
        Ok(_) => None,
        Err(e) => return Err(ExtractError::Gpx(e.to_string())),
    };
    Ok(text)
}

/// GPX times are ISO-8601; a missing offset is taken as UTC.
pub fn parse_time(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}
