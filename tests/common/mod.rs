use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use filetime::{FileTime, set_file_mtime};
use std::path::Path;

/// Minimal little-endian JPEG carrying `date` in the DateTime (0x0132) tag.
pub fn jpeg_with_date(date: &str) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0132u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(date.as_bytes());
    tiff.push(0);

    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((tiff.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Write a JPEG with an embedded capture date at `rel` under `dir`.
pub fn write_dated_jpeg(dir: &TempDir, rel: &str, date: &str) -> ChildPath {
    let child = dir.child(rel);
    child.write_binary(&jpeg_with_date(date)).unwrap();
    child
}

/// Write a file without metadata whose modification time falls mid-way
/// through `year`.
pub fn write_undated(dir: &TempDir, rel: &str, year: i32) -> ChildPath {
    let child = dir.child(rel);
    child.write_str("plain bytes").unwrap();
    set_mtime_year(child.path(), year);
    child
}

pub fn set_mtime_year(path: &Path, year: i32) {
    let date = time::Date::from_calendar_date(year, time::Month::June, 15).unwrap();
    let secs = date.midnight().assume_utc().unix_timestamp();
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}
