//! Capture-year resolution as an ordered chain of year sources.

use crate::yearsort_core::error::{Result, YearsortError};
use crate::yearsort_core::exif::find_capture_date;
use crate::yearsort_core::photo::{AssetRef, CaptureYear};
use crate::yearsort_core::probe::MetadataProbe;
use crate::yearsort_core::storage::{Stat, StorageBackend};
use std::cell::OnceCell;

/// How many leading bytes are read when looking for an embedded EXIF date.
pub const EMBEDDED_SCAN_LIMIT: usize = 128 * 1024;

/// One asset being resolved. Backend metadata is fetched at most once per
/// resolution, however many sources ask for it.
pub struct Lookup<'a, B: StorageBackend> {
    pub backend: &'a B,
    pub asset: &'a AssetRef<B::Locator>,
    stat: OnceCell<std::result::Result<Stat, String>>,
}

impl<'a, B: StorageBackend> Lookup<'a, B> {
    pub fn new(backend: &'a B, asset: &'a AssetRef<B::Locator>) -> Self {
        Lookup {
            backend,
            asset,
            stat: OnceCell::new(),
        }
    }

    pub fn stat(&self) -> Result<Stat> {
        if let Some(cached) = self.stat.get() {
            return cached.clone().map_err(YearsortError::Other);
        }
        let result = self.backend.stat(&self.asset.source);
        let _ = self
            .stat
            .set(result.as_ref().copied().map_err(|e| e.to_string()));
        result
    }
}

/// One step of the fallback chain. `Ok(None)` and `Err` both mean "try the
/// next source".
pub trait YearSource<B: StorageBackend>: Send + Sync {
    fn name(&self) -> &'static str;
    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>>;
}

/// A resolved year and the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub year: CaptureYear,
    pub source: &'static str,
}

pub const CURRENT_YEAR_SOURCE: &str = "current-year";

/// Runs year sources in order; falls back to the current year.
pub struct Resolver<B: StorageBackend> {
    sources: Vec<Box<dyn YearSource<B>>>,
    current_year: Option<CaptureYear>,
}

impl<B: StorageBackend> Resolver<B> {
    pub fn new(sources: Vec<Box<dyn YearSource<B>>>) -> Self {
        Resolver {
            sources,
            current_year: None,
        }
    }

    /// The standard chain: external probe (when given), embedded EXIF,
    /// backend capture time, creation time, modification time.
    pub fn standard(probe: Option<Box<dyn MetadataProbe>>) -> Self {
        let mut sources: Vec<Box<dyn YearSource<B>>> = Vec::new();
        if let Some(probe) = probe {
            sources.push(Box::new(ProbeSource { probe }));
        }
        sources.push(Box::new(EmbeddedExifSource {
            limit: EMBEDDED_SCAN_LIMIT,
        }));
        sources.push(Box::new(BackendCaptureSource));
        sources.push(Box::new(CreatedTimeSource));
        sources.push(Box::new(ModifiedTimeSource));
        Self::new(sources)
    }

    /// Pin the terminal fallback instead of reading the clock.
    pub fn with_current_year(mut self, year: CaptureYear) -> Self {
        self.current_year = Some(year);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve the capture year of one asset. Never fails.
    pub fn resolve(&self, backend: &B, asset: &AssetRef<B::Locator>) -> Resolution {
        let lookup = Lookup::new(backend, asset);
        for source in &self.sources {
            match source.year(&lookup) {
                Ok(Some(year)) => {
                    log::debug!("{}: year {} from {}", asset.name, year, source.name());
                    return Resolution {
                        year,
                        source: source.name(),
                    };
                }
                Ok(None) => {}
                Err(e) => log::debug!("{}: {} failed: {}", asset.name, source.name(), e),
            }
        }

        let year = self.current_year.unwrap_or_else(CaptureYear::current);
        log::warn!(
            "Could not determine capture year for {}, using {}",
            asset.name,
            year
        );
        Resolution {
            year,
            source: CURRENT_YEAR_SOURCE,
        }
    }
}

/// Accept a probe's line only when it is exactly four digits.
pub fn parse_probe_line(line: &str) -> Option<CaptureYear> {
    line.trim().parse().ok()
}

/// Year reported by an external tool such as exiftool.
pub struct ProbeSource {
    pub probe: Box<dyn MetadataProbe>,
}

impl<B: StorageBackend> YearSource<B> for ProbeSource {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>> {
        let Some(path) = lookup.backend.local_path(&lookup.asset.source) else {
            return Ok(None);
        };
        let line = self.probe.first_line(&path)?;
        Ok(parse_probe_line(&line))
    }
}

/// Date found by parsing the asset's own EXIF block.
pub struct EmbeddedExifSource {
    pub limit: usize,
}

impl<B: StorageBackend> YearSource<B> for EmbeddedExifSource {
    fn name(&self) -> &'static str {
        "embedded-exif"
    }

    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>> {
        let bytes = lookup.backend.read_bytes(&lookup.asset.source, self.limit)?;
        Ok(find_capture_date(&bytes).and_then(|date| CaptureYear::new(date.year())))
    }
}

/// Capture time the backend already indexed.
pub struct BackendCaptureSource;

impl<B: StorageBackend> YearSource<B> for BackendCaptureSource {
    fn name(&self) -> &'static str {
        "backend-capture-time"
    }

    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>> {
        Ok(lookup.stat()?.captured_at.and_then(CaptureYear::of))
    }
}

/// When the object was created in its storage.
pub struct CreatedTimeSource;

impl<B: StorageBackend> YearSource<B> for CreatedTimeSource {
    fn name(&self) -> &'static str {
        "created-time"
    }

    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>> {
        Ok(lookup.stat()?.created_at.and_then(CaptureYear::of))
    }
}

/// Last modification time of the object.
pub struct ModifiedTimeSource;

impl<B: StorageBackend> YearSource<B> for ModifiedTimeSource {
    fn name(&self) -> &'static str {
        "modified-time"
    }

    fn year(&self, lookup: &Lookup<'_, B>) -> Result<Option<CaptureYear>> {
        Ok(CaptureYear::of(lookup.stat()?.modified_at))
    }
}
