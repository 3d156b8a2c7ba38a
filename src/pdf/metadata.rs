//! Document information dictionary decoding.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Dictionary, Document, Object};

use crate::models::DocumentMetadata;

/// Fill the info-dictionary fields of `metadata` from `document`.
///
/// Absent or undecodable entries are left empty.
pub(crate) fn apply_info(document: &Document, metadata: &mut DocumentMetadata) {
    metadata.page_count = document.get_pages().len() as u32;
    let Some(info) = info_dictionary(document) else {
        return;
    };
    metadata.title = info_text(document, info, b"Title");
    metadata.author = info_text(document, info, b"Author");
    metadata.subject = info_text(document, info, b"Subject");
    metadata.creator = info_text(document, info, b"Creator");
    metadata.creation_date = parse_pdf_date(&info_text(document, info, b"CreationDate"));
    metadata.modification_date = parse_pdf_date(&info_text(document, info, b"ModDate"));
}

/// The trailer's `/Info` dictionary, following a reference if needed.
fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    match document.trailer.get(b"Info").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// A text entry of the info dictionary, or an empty string.
fn info_text(document: &Document, info: &Dictionary, key: &[u8]) -> String {
    let value = match info.get(key) {
        Ok(Object::Reference(id)) => document.get_object(*id).ok(),
        Ok(object) => Some(object),
        Err(_) => None,
    };
    match value {
        Some(Object::String(bytes, _)) => decode_pdf_string(bytes).trim().to_string(),
        _ => String::new(),
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte order
/// mark, otherwise single-byte (PDFDocEncoding, read as Latin-1).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse a PDF date such as `D:20230115103000+02'00'`.
///
/// Everything after the year is optional. Missing time zone means UTC.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |from: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(from..from + len) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = parse_offset(&raw[digits.len()..]).unwrap_or_else(|| FixedOffset::east_opt(0))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `Z`, `+HH'mm'`, `-HH'mm` or `+HH`. `None` when absent or malformed.
fn parse_offset(rest: &str) -> Option<Option<FixedOffset>> {
    let mut chars = rest.chars();
    let sign = match chars.next()? {
        'Z' | 'z' => return Some(FixedOffset::east_opt(0)),
        '+' => 1,
        '-' => -1,
        _ => return None,
    };
    let digits: String = chars.filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
    Some(FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)))
}
