use crate::yearsort_core::error::Result;
use crate::yearsort_core::media::is_photo_name;
use crate::yearsort_core::photo::AssetRef;
use crate::yearsort_core::storage::{Entry, StorageBackend};
use std::collections::HashSet;

/// Recursively collect the photos under `root`, depth first.
///
/// Only a failure to list `root` itself is returned as an error; unreadable
/// subfolders are logged and skipped. A folder named `skip_top_level`
/// directly under the root is not entered (the destination namespace).
/// Folders reached twice through links are visited once.
pub fn discover<B: StorageBackend>(
    backend: &B,
    root: &B::Locator,
    skip_top_level: Option<&str>,
) -> Result<Vec<AssetRef<B::Locator>>> {
    let mut assets = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(backend.canonical(root));

    let entries = backend.list(root)?;
    walk_entries(backend, entries, "", skip_top_level, &mut visited, &mut assets);

    log::info!(
        "Found {} photos under {}",
        assets.len(),
        backend.describe(root)
    );
    Ok(assets)
}

fn walk_entries<B: StorageBackend>(
    backend: &B,
    entries: Vec<Entry<B::Locator>>,
    origin: &str,
    skip: Option<&str>,
    visited: &mut HashSet<B::Locator>,
    assets: &mut Vec<AssetRef<B::Locator>>,
) {
    for entry in entries {
        if !entry.is_dir {
            if is_photo_name(&entry.name) {
                assets.push(AssetRef {
                    name: entry.name,
                    source: entry.locator,
                    origin: origin.to_string(),
                });
            }
            continue;
        }

        if skip == Some(entry.name.as_str()) {
            log::debug!("Skipping destination folder {}", entry.name);
            continue;
        }

        if !visited.insert(backend.canonical(&entry.locator)) {
            log::warn!(
                "Skipping {}: folder already visited (link cycle?)",
                backend.describe(&entry.locator)
            );
            continue;
        }

        let children = match backend.list(&entry.locator) {
            Ok(children) => children,
            Err(e) => {
                log::warn!("Error reading folder {}: {}", backend.describe(&entry.locator), e);
                continue;
            }
        };

        let child_origin = if origin.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", origin, entry.name)
        };
        // Only the root level carries the destination folder.
        walk_entries(backend, children, &child_origin, None, visited, assets);
    }
}
