//! Minimal EXIF date reader for JPEG containers.
//!
//! Used when no external metadata tool is available. Only the first IFD of
//! the first APP1 segment is inspected, and only little-endian (`II`) TIFF
//! headers are understood. Anything unexpected is reported as "not found".

use time::PrimitiveDateTime;
use time::format_description::FormatItem;

/// Date format used in EXIF data.
const EXIF_DATE_FORMAT: &[FormatItem] =
    time::macros::format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

const DASHED_DATE_FORMAT: &[FormatItem] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const ISO_DATE_FORMAT: &[FormatItem] =
    time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const SOI_MARKER: u16 = 0xFFD8;
const APP1_MARKER: u16 = 0xFFE1;
const SOS_MARKER: u16 = 0xFFDA;

const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";
const LITTLE_ENDIAN: &[u8] = b"II";

const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_DATE_TIME: u16 = 0x0132;

const IFD_ENTRY_SIZE: usize = 12;
const DATE_STRING_LEN: usize = 19;

fn be_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at.checked_add(2)?)?;
    Some(u16::from_be_bytes(bytes.try_into().ok()?))
}

fn le_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn le_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Find the capture date embedded in a JPEG's EXIF block.
pub fn find_capture_date(bytes: &[u8]) -> Option<PrimitiveDateTime> {
    if be_u16(bytes, 0)? != SOI_MARKER {
        return None;
    }

    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        let marker = be_u16(bytes, offset)?;
        if marker >> 8 != 0xFF || marker == SOS_MARKER {
            return None;
        }

        // The length counts itself but not the marker.
        let length = be_u16(bytes, offset + 2)? as usize;
        if length < 2 {
            return None;
        }

        if marker == APP1_MARKER {
            let payload = bytes.get(offset + 4..offset + 2 + length)?;
            return date_from_app1(payload);
        }

        offset += 2 + length;
    }

    None
}

/// Read the date tag out of an APP1 payload. Offsets inside the TIFF
/// structure are relative to the byte-order indicator.
fn date_from_app1(payload: &[u8]) -> Option<PrimitiveDateTime> {
    let tiff = payload.strip_prefix(EXIF_IDENTIFIER).unwrap_or(payload);
    if tiff.get(0..2)? != LITTLE_ENDIAN {
        log::trace!("EXIF block is not little-endian, skipping");
        return None;
    }

    let ifd_offset = le_u32(tiff, 4)? as usize;
    let entry_count = le_u16(tiff, ifd_offset)? as usize;

    for i in 0..entry_count {
        let entry = ifd_offset + 2 + i * IFD_ENTRY_SIZE;
        let tag = le_u16(tiff, entry)?;
        if tag != TAG_DATE_TIME_ORIGINAL && tag != TAG_DATE_TIME {
            continue;
        }

        let value_offset = le_u32(tiff, entry + 8)? as usize;
        let raw = tiff.get(value_offset..value_offset.checked_add(DATE_STRING_LEN)?)?;
        let Ok(text) = std::str::from_utf8(raw) else {
            continue;
        };
        if let Some(date) = parse_date_time(text) {
            return Some(date);
        }
    }

    None
}

/// Parse an EXIF-style date-time string.
pub fn parse_date_time(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim_end_matches('\0').trim();
    [EXIF_DATE_FORMAT, DASHED_DATE_FORMAT, ISO_DATE_FORMAT]
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
}
