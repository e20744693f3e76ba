use crate::yearsort_core::error::{Result, YearsortError};
use crate::yearsort_core::photo::{AssetRef, CaptureYear};
use crate::yearsort_core::report::{OrganizationResult, ProgressEvent, Tally};
use crate::yearsort_core::resolver::{Resolution, Resolver};
use crate::yearsort_core::scan::discover;
use crate::yearsort_core::storage::{DuplicatePolicy, StorageBackend, next_free_name};
use crate::yearsort_core::workers::resolve_years;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Name of the destination folder created under the scan root.
pub const DEFAULT_DESTINATION_NAME: &str = "Organized photo";

/// Settings for one organization run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub destination_name: String,
    /// Overrides the backend's own duplicate policy.
    pub duplicate_policy: Option<DuplicatePolicy>,
    /// Year-resolution workers; 1 keeps everything on the calling thread.
    pub jobs: usize,
    /// Resolve and count, but create and copy nothing.
    pub dry_run: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        OrganizeOptions {
            destination_name: DEFAULT_DESTINATION_NAME.to_string(),
            duplicate_policy: None,
            jobs: 1,
            dry_run: false,
        }
    }
}

/// Cooperative cancellation shared between the caller and a running organizer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(YearsortError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Terminal state of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Placement {
    Placed,
    Renamed(String),
    Duplicate,
}

/// Copies photos into per-year folders under a destination folder.
pub struct Organizer<'a, B: StorageBackend> {
    backend: &'a B,
    resolver: &'a Resolver<B>,
    options: OrganizeOptions,
    cancel: CancelToken,
}

/// Per-run destination state.
///
/// In a dry run nothing is created, so `root` and the year folders are only
/// known when they already exist. `claimed` holds every name this run has
/// put (or would put) into each year folder.
struct Destination<L> {
    root: Option<L>,
    years: HashMap<CaptureYear, Option<L>>,
    claimed: HashMap<CaptureYear, HashSet<String>>,
    dry_run: bool,
}

impl<L> Destination<L> {
    fn new(root: Option<L>, dry_run: bool) -> Self {
        Destination {
            root,
            years: HashMap::new(),
            claimed: HashMap::new(),
            dry_run,
        }
    }
}

impl<'a, B: StorageBackend> Organizer<'a, B> {
    pub fn new(backend: &'a B, resolver: &'a Resolver<B>, options: OrganizeOptions) -> Self {
        Organizer {
            backend,
            resolver,
            options,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn policy(&self) -> DuplicatePolicy {
        self.options
            .duplicate_policy
            .unwrap_or_else(|| self.backend.duplicate_policy())
    }

    /// Organize every photo under `root`. Never returns an error: a run that
    /// cannot start comes back as an unsuccessful result.
    pub fn organize(
        &self,
        root: &B::Locator,
        mut on_progress: impl FnMut(ProgressEvent),
    ) -> OrganizationResult {
        match self.run(root, &mut on_progress) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Error organizing photos: {}", e);
                OrganizationResult::failed(format!("Error organizing photos: {}", e))
            }
        }
    }

    fn run(
        &self,
        root: &B::Locator,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<OrganizationResult> {
        let dest_name = self.options.destination_name.as_str();
        log::info!("Phase 1: Discovering photos in {}", self.backend.describe(root));
        let assets = discover(self.backend, root, Some(dest_name))?;

        if assets.is_empty() {
            return Ok(OrganizationResult::failed(
                "No photo files found in the selected folder or its subfolders",
            ));
        }

        let total = assets.len();
        let mut resolved = if self.options.jobs > 1 {
            log::info!("Phase 2: Resolving capture years on {} workers", self.options.jobs);
            resolve_years(self.backend, self.resolver, &assets, self.options.jobs, &self.cancel)
        } else {
            Vec::new()
        };

        let dest_root = if self.options.dry_run {
            self.find_folder(root, dest_name)?
        } else {
            Some(self.backend.create_folder(root, dest_name)?)
        };
        let mut destination = Destination::new(dest_root, self.options.dry_run);

        log::info!("Phase 3: Placing {} photos", total);
        let mut tally = Tally::default();
        let mut cancelled = false;

        for (index, asset) in assets.iter().enumerate() {
            let pre_resolved = resolved.get_mut(index).and_then(Option::take);
            match self.process_asset(asset, pre_resolved, &mut destination) {
                Ok((year, Placement::Placed)) => tally.placed(year),
                Ok((year, Placement::Renamed(new_name))) => {
                    log::info!("Duplicate name {} copied as {}", asset.name, new_name);
                    tally.renamed(year, &asset.name);
                }
                Ok((_, Placement::Duplicate)) => {
                    log::info!("Duplicate found: {}", asset.name);
                    tally.duplicate(&asset.name);
                }
                Err(YearsortError::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    log::error!("Error processing {}: {}", asset.name, e);
                    tally.problem(&asset.name);
                }
            }

            on_progress(ProgressEvent {
                processed: tally.completed(),
                total,
                current: asset.name.clone(),
                origin: asset.origin_label().to_string(),
            });
        }

        let dest_label = match &destination.root {
            Some(dest_root) => self.backend.describe(dest_root),
            None => format!("{}/{}", self.backend.describe(root), dest_name),
        };
        let processed = tally.processed();

        let (success, message) = if cancelled {
            log::warn!("Organization cancelled after {} of {} photos", tally.completed(), total);
            (
                false,
                format!(
                    "Cancelled after {} of {} photos; {} copied into \"{}\"",
                    tally.completed(),
                    total,
                    processed,
                    dest_name
                ),
            )
        } else if self.options.dry_run {
            (
                true,
                format!("Dry run: {} photos would be organized into \"{}\"", processed, dest_name),
            )
        } else {
            (
                true,
                format!(
                    "Successfully organized {} photos from all subfolders into \"{}\" folder!",
                    processed, dest_name
                ),
            )
        };

        let mut result = tally.finish(success, message, total, dest_label);
        result.cancelled = cancelled;
        result.dry_run = self.options.dry_run;
        log::info!(
            "Organization finished: {} copied, {} duplicates, {} problematic",
            result.processed,
            result.duplicates,
            result.problematic
        );
        Ok(result)
    }

    /// Drive one asset from discovered to a terminal state. A dry run makes
    /// the same placement decisions but creates and copies nothing.
    fn process_asset(
        &self,
        asset: &AssetRef<B::Locator>,
        pre_resolved: Option<Resolution>,
        destination: &mut Destination<B::Locator>,
    ) -> Result<(CaptureYear, Placement)> {
        self.cancel.check()?;
        let resolution = match pre_resolved {
            Some(resolution) => resolution,
            None => self.resolver.resolve(self.backend, asset),
        };
        let year = resolution.year;

        self.cancel.check()?;
        let folder = self.year_folder(year, destination)?;

        self.cancel.check()?;
        let claimed = destination.claimed.entry(year).or_default();
        let taken = |name: &str| -> Result<bool> {
            if claimed.contains(name) {
                return Ok(true);
            }
            match &folder {
                Some(folder) => self.backend.exists(folder, name),
                None => Ok(false),
            }
        };

        let (placement, target) = if !taken(&asset.name)? {
            (Placement::Placed, asset.name.clone())
        } else {
            match self.policy() {
                DuplicatePolicy::Skip => return Ok((year, Placement::Duplicate)),
                DuplicatePolicy::Rename => {
                    let new_name = next_free_name(&asset.name, taken)?;
                    (Placement::Renamed(new_name.clone()), new_name)
                }
            }
        };

        if !destination.dry_run {
            let Some(folder) = &folder else {
                let missing = format!("{}/{}", self.options.destination_name, year);
                return Err(YearsortError::PathNotFound(missing.into()));
            };
            self.backend.copy(&asset.source, folder, &target)?;
            log::debug!(
                "Copied {} from {} to {}/{}/{}",
                asset.name,
                asset.origin_label(),
                self.options.destination_name,
                year,
                target
            );
        }
        claimed.insert(target);
        Ok((year, placement))
    }

    /// Return the folder for `year`, creating it on first use in this run.
    /// In a dry run an absent folder is reported as `None`.
    fn year_folder(
        &self,
        year: CaptureYear,
        destination: &mut Destination<B::Locator>,
    ) -> Result<Option<B::Locator>> {
        if let Some(folder) = destination.years.get(&year) {
            return Ok(folder.clone());
        }

        let folder = match &destination.root {
            Some(root) if destination.dry_run => self.find_folder(root, &year.to_string())?,
            Some(root) => Some(self.backend.create_folder(root, &year.to_string())?),
            None => None,
        };
        destination.years.insert(year, folder.clone());
        Ok(folder)
    }

    /// Look up an existing child folder without creating it.
    fn find_folder(&self, parent: &B::Locator, name: &str) -> Result<Option<B::Locator>> {
        Ok(self
            .backend
            .list(parent)?
            .into_iter()
            .find(|entry| entry.is_dir && entry.name == name)
            .map(|entry| entry.locator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yearsort_core::remote::{MEMORY_ROOT_ID, MemoryFolderApi, RemoteBackend};
    use time::macros::datetime;

    fn remote_with(names: &[&str]) -> RemoteBackend<MemoryFolderApi> {
        let remote = RemoteBackend::new(MemoryFolderApi::new());
        for name in names {
            remote
                .api()
                .add_file(MEMORY_ROOT_ID, name, datetime!(2019-04-04 4:00 UTC), None);
        }
        remote
    }

    #[test]
    fn test_precancelled_run_places_nothing() {
        let remote = remote_with(&["a.jpg", "b.jpg"]);
        let resolver = Resolver::standard(None);
        let cancel = CancelToken::new();
        cancel.cancel();
        let organizer = Organizer::new(&remote, &resolver, OrganizeOptions::default())
            .with_cancel_token(cancel);

        let mut events = 0;
        let result = organizer.organize(&MEMORY_ROOT_ID.to_string(), |_| events += 1);
        assert!(!result.success);
        assert!(result.cancelled);
        assert_eq!(result.total_assets, 2);
        assert_eq!(result.processed, 0);
        assert_eq!(events, 0);
        assert!(result.message.starts_with("Cancelled after 0 of 2 photos"));
    }

    #[test]
    fn test_policy_override_beats_backend_default() {
        let remote = remote_with(&["a.jpg"]);
        let resolver = Resolver::standard(None);
        let options = OrganizeOptions {
            duplicate_policy: Some(DuplicatePolicy::Skip),
            ..OrganizeOptions::default()
        };
        let organizer = Organizer::new(&remote, &resolver, options);
        assert_eq!(organizer.policy(), DuplicatePolicy::Skip);

        let first = organizer.organize(&MEMORY_ROOT_ID.to_string(), |_| {});
        assert_eq!(first.processed, 1);
        let second = organizer.organize(&MEMORY_ROOT_ID.to_string(), |_| {});
        assert_eq!(second.processed, 0);
        assert_eq!(second.duplicates, 1);
    }

    #[test]
    fn test_default_options() {
        let options = OrganizeOptions::default();
        assert_eq!(options.destination_name, "Organized photo");
        assert_eq!(options.jobs, 1);
        assert!(options.duplicate_policy.is_none());
        assert!(!options.dry_run);
    }
}
