//! MIME sniffing and file classification.
//!
//! Classification produces a closed [`FileKind`] once per file; everything
//! downstream matches on it exhaustively. XML MIME types are ambiguous, so a
//! file is only [`FileKind::Gpx`] if its root element is `<gpx>`.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const MIME_OCTET_STREAM: &str = "application/octet-stream";
pub const MIME_TEXT_XML: &str = "text/xml";
pub const MIME_APPLICATION_XML: &str = "application/xml";
pub const MIME_GPX: &str = "application/gpx+xml";

/// Bytes read from the head of a file for magic-byte detection.
const SNIFF_LEN: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Gpx,
    Image,
    Video,
    Unsupported,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Gpx => "gpx",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Unsupported => "unsupported",
        }
    }
}

/// Detect a file's MIME type from its leading bytes.
///
/// Never fails: unreadable or unrecognised content is reported as
/// `application/octet-stream`.
pub fn sniff_mime(path: &Path) -> String {
    let Ok(mut file) = File::open(path) else {
        return MIME_OCTET_STREAM.to_string();
    };
    let mut buffer = [0u8; SNIFF_LEN];
    let Ok(bytes_read) = file.read(&mut buffer) else {
        return MIME_OCTET_STREAM.to_string();
    };

    sniff_mime_from_buffer(&buffer[..bytes_read], path)
}

pub fn sniff_mime_from_buffer(buffer: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(buffer) {
        return kind.mime_type().to_string();
    }

    if looks_like_xml(buffer) {
        return MIME_TEXT_XML.to_string();
    }

    let is_gpx_extension = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gpx"))
        .unwrap_or(false);
    if is_gpx_extension {
        return MIME_GPX.to_string();
    }

    MIME_OCTET_STREAM.to_string()
}

fn looks_like_xml(buffer: &[u8]) -> bool {
    let text = buffer.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(buffer);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let text = &text[start..];
    text.starts_with(b"<?xml") || text.starts_with(b"<gpx")
}

/// Map a file to its [`FileKind`].
///
/// The GPX check runs first since GPX files report XML MIME types that
/// would otherwise fall through.
pub fn classify(path: &Path, mime_type: &str) -> FileKind {
    if is_xml_mime(mime_type) {
        return if is_gpx(path) {
            FileKind::Gpx
        } else {
            FileKind::Unsupported
        };
    }

    if mime_type.starts_with("image/") {
        FileKind::Image
    } else if mime_type.starts_with("video/") {
        FileKind::Video
    } else {
        FileKind::Unsupported
    }
}

fn is_xml_mime(mime_type: &str) -> bool {
    matches!(mime_type, MIME_TEXT_XML | MIME_APPLICATION_XML | MIME_GPX)
}

/// True if the file parses as XML and its root element is `gpx`, with or
/// without a namespace prefix. Any I/O or parse error yields `false`.
pub fn is_gpx(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return e.local_name().as_ref() == b"gpx";
            }
            Ok(Event::Eof) | Err(_) => return false,
            _ => {}
        }
        buf.clear();
    }
}
