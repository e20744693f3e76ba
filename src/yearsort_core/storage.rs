use crate::yearsort_core::error::{Result, YearsortError};
use crate::yearsort_core::media::split_name;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::PathBuf;
use time::OffsetDateTime;

/// One child of a listed folder.
#[derive(Debug, Clone)]
pub struct Entry<L> {
    pub name: String,
    pub is_dir: bool,
    pub locator: L,
}

/// Timestamps reported by a backend for one object.
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub modified_at: OffsetDateTime,
    /// Capture time the backend already knows about (e.g. image metadata
    /// indexed by a remote service). Local files report `None`.
    pub captured_at: Option<OffsetDateTime>,
    /// When the object was created in this storage. Local files report
    /// `None`: a copied file gets a fresh birth time.
    pub created_at: Option<OffsetDateTime>,
}

/// What happens when the destination already holds an object with the
/// incoming asset's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// Record the name as a duplicate and leave the destination alone.
    Skip,
    /// Copy under `stem_N.ext` with the lowest free N, and still record the
    /// original name as a duplicate.
    Rename,
}

/// Storage the organizer reads from and writes to.
///
/// All mutating operations are additive: folders are created if absent and
/// copies never replace an existing object.
pub trait StorageBackend: Sync {
    type Locator: Clone + Debug + Eq + Hash + Send + Sync;

    /// List the direct children of a folder.
    fn list(&self, folder: &Self::Locator) -> Result<Vec<Entry<Self::Locator>>>;

    fn stat(&self, locator: &Self::Locator) -> Result<Stat>;

    /// Whether `folder` already holds an object called `name`.
    fn exists(&self, folder: &Self::Locator, name: &str) -> Result<bool>;

    /// Create `name` under `parent`, or return the existing folder.
    fn create_folder(&self, parent: &Self::Locator, name: &str) -> Result<Self::Locator>;

    /// Copy `source` into `dest_folder` as `name`. Fails if `name` exists.
    fn copy(&self, source: &Self::Locator, dest_folder: &Self::Locator, name: &str)
        -> Result<Self::Locator>;

    /// Read at most `limit` leading bytes of an object.
    fn read_bytes(&self, _locator: &Self::Locator, _limit: usize) -> Result<Vec<u8>> {
        Err(YearsortError::Unsupported("read_bytes"))
    }

    /// How this backend treats name collisions in the destination.
    fn duplicate_policy(&self) -> DuplicatePolicy;

    /// Filesystem path of an object, for tools that need one.
    fn local_path(&self, _locator: &Self::Locator) -> Option<PathBuf> {
        None
    }

    /// Stable identity of a folder, used to detect traversal cycles.
    fn canonical(&self, locator: &Self::Locator) -> Self::Locator {
        locator.clone()
    }

    /// Human readable form of a locator for reports and logs.
    fn describe(&self, locator: &Self::Locator) -> String;
}

/// Pick `stem_N.ext` with the lowest N >= 1 not present in `folder`.
pub fn unique_name<B: StorageBackend>(backend: &B, folder: &B::Locator, name: &str) -> Result<String> {
    next_free_name(name, |candidate| backend.exists(folder, candidate))
}

/// Pick `stem_N.ext` with the lowest N >= 1 for which `taken` is false.
pub fn next_free_name(name: &str, mut taken: impl FnMut(&str) -> Result<bool>) -> Result<String> {
    let (stem, ext) = split_name(name);
    let mut counter = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        if !taken(&candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}
