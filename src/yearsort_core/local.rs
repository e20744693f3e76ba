use crate::yearsort_core::error::{Result, YearsortError};
use crate::yearsort_core::storage::{DuplicatePolicy, Entry, Stat, StorageBackend};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use time::OffsetDateTime;
use walkdir::WalkDir;

/// Storage backend over the local filesystem.
///
/// Name collisions in the destination are skipped and reported as
/// duplicates; the engine never compares file contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        LocalBackend
    }
}

impl StorageBackend for LocalBackend {
    type Locator = PathBuf;

    fn list(&self, folder: &PathBuf) -> Result<Vec<Entry<PathBuf>>> {
        if !folder.exists() {
            return Err(YearsortError::PathNotFound(folder.clone()));
        }
        if !folder.is_dir() {
            return Err(YearsortError::NotADirectory(folder.clone()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // The folder itself could not be read: that is the caller's problem.
                    if e.depth() == 0 {
                        return Err(e.into());
                    }
                    log::warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                    continue;
                }
            };

            let is_dir = entry.file_type().is_dir();
            if !is_dir && !entry.file_type().is_file() {
                log::debug!("Skipping special file {}", entry.path().display());
                continue;
            }

            entries.push(Entry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
                locator: entry.into_path(),
            });
        }

        Ok(entries)
    }

    fn stat(&self, locator: &PathBuf) -> Result<Stat> {
        let metadata = fs::metadata(locator)?;
        Ok(Stat {
            modified_at: OffsetDateTime::from(metadata.modified()?),
            captured_at: None,
            created_at: None,
        })
    }

    fn exists(&self, folder: &PathBuf, name: &str) -> Result<bool> {
        Ok(folder.join(name).try_exists()?)
    }

    fn create_folder(&self, parent: &PathBuf, name: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        match fs::create_dir(&path) {
            Ok(()) => {
                log::info!("Created folder {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(path),
            Err(e) => Err(e.into()),
        }
    }

    fn copy(&self, source: &PathBuf, dest_folder: &PathBuf, name: &str) -> Result<PathBuf> {
        let destination = dest_folder.join(name);
        let mut reader = File::open(source)?;

        // create_new refuses to replace anything already at the destination.
        let mut writer = match OpenOptions::new().write(true).create_new(true).open(&destination) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(YearsortError::AlreadyExists(destination.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = io::copy(&mut reader, &mut writer) {
            drop(writer);
            let _ = fs::remove_file(&destination);
            return Err(e.into());
        }

        log::debug!("Copied {} -> {}", source.display(), destination.display());
        Ok(destination)
    }

    fn read_bytes(&self, locator: &PathBuf, limit: usize) -> Result<Vec<u8>> {
        let file = File::open(locator)?;
        let mut buf = Vec::new();
        file.take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy::Skip
    }

    fn local_path(&self, locator: &PathBuf) -> Option<PathBuf> {
        Some(locator.clone())
    }

    fn canonical(&self, locator: &PathBuf) -> PathBuf {
        fs::canonicalize(locator).unwrap_or_else(|_| locator.clone())
    }

    fn describe(&self, locator: &PathBuf) -> String {
        locator.display().to_string()
    }
}
