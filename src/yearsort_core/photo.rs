use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::yearsort_core::error::YearsortError;

/// A four digit calendar year used to place an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureYear(u16);

impl CaptureYear {
    /// Build a year, rejecting anything that is not exactly four digits.
    pub fn new(year: i32) -> Option<Self> {
        (1000..=9999).contains(&year).then(|| CaptureYear(year as u16))
    }

    pub fn of(date: OffsetDateTime) -> Option<Self> {
        Self::new(date.year())
    }

    /// The current calendar year in local time (UTC if the offset is unknown).
    pub fn current() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self::of(now).unwrap_or(CaptureYear(1970))
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for CaptureYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for CaptureYear {
    type Err = YearsortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(YearsortError::InvalidDateFormat(format!(
                "'{}' is not a four digit year",
                s
            )));
        }
        let year: i32 = s
            .parse()
            .map_err(|_| YearsortError::InvalidDateFormat(s.to_string()))?;
        CaptureYear::new(year).ok_or_else(|| YearsortError::InvalidDateFormat(s.to_string()))
    }
}

impl Serialize for CaptureYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A photo found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef<L> {
    /// Display name; not unique across the scanned tree.
    pub name: String,
    /// Backend handle of the source object.
    pub source: L,
    /// Parent folders relative to the scan root, joined with `/`.
    pub origin: String,
}

impl<L> AssetRef<L> {
    pub fn origin_label(&self) -> &str {
        if self.origin.is_empty() { "." } else { &self.origin }
    }
}
