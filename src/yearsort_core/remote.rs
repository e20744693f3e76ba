use crate::yearsort_core::error::{Result, YearsortError};
use crate::yearsort_core::storage::{DuplicatePolicy, Entry, Stat, StorageBackend};
use std::collections::HashMap;
use std::sync::Mutex;
use time::OffsetDateTime;

/// A file or folder as reported by a remote folder API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub parent: Option<String>,
    pub modified_time: OffsetDateTime,
    /// Capture time taken from the service's image metadata, if indexed.
    pub image_time: Option<OffsetDateTime>,
    pub created_time: Option<OffsetDateTime>,
}

/// The handful of calls the organizer needs from a remote folder service.
///
/// Implementations own transport concerns such as authentication and
/// per-request deadlines; a request that times out should surface as an
/// error so the organizer can mark the item problematic.
pub trait RemoteFolderApi: Sync {
    fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteFile>>;
    fn get(&self, id: &str) -> Result<RemoteFile>;
    fn create_folder(&self, parent_id: &str, name: &str) -> Result<RemoteFile>;
    fn copy_file(&self, file_id: &str, new_name: &str, dest_folder_id: &str) -> Result<RemoteFile>;
}

/// Storage backend over a remote folder API. Locators are object ids.
///
/// Unlike the local backend, a name collision in the destination is resolved
/// by copying under a numbered name (`photo_1.jpg`), because remote folders
/// may legitimately hold several objects with the same name.
pub struct RemoteBackend<A> {
    api: A,
}

impl<A: RemoteFolderApi> RemoteBackend<A> {
    pub fn new(api: A) -> Self {
        RemoteBackend { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn find_child(&self, folder: &str, name: &str) -> Result<Option<RemoteFile>> {
        Ok(self
            .api
            .list_children(folder)?
            .into_iter()
            .find(|f| f.name == name))
    }
}

impl<A: RemoteFolderApi> StorageBackend for RemoteBackend<A> {
    type Locator = String;

    fn list(&self, folder: &String) -> Result<Vec<Entry<String>>> {
        Ok(self
            .api
            .list_children(folder)?
            .into_iter()
            .map(|f| Entry {
                name: f.name,
                is_dir: f.is_folder,
                locator: f.id,
            })
            .collect())
    }

    fn stat(&self, locator: &String) -> Result<Stat> {
        let file = self.api.get(locator)?;
        Ok(Stat {
            modified_at: file.modified_time,
            captured_at: file.image_time,
            created_at: file.created_time,
        })
    }

    fn exists(&self, folder: &String, name: &str) -> Result<bool> {
        Ok(self.find_child(folder, name)?.is_some())
    }

    fn create_folder(&self, parent: &String, name: &str) -> Result<String> {
        if let Some(existing) = self.find_child(parent, name)? {
            if existing.is_folder {
                return Ok(existing.id);
            }
        }
        let created = self.api.create_folder(parent, name)?;
        log::info!("Created remote folder {} ({})", name, created.id);
        Ok(created.id)
    }

    fn copy(&self, source: &String, dest_folder: &String, name: &str) -> Result<String> {
        if self.exists(dest_folder, name)? {
            return Err(YearsortError::AlreadyExists(name.to_string()));
        }
        Ok(self.api.copy_file(source, name, dest_folder)?.id)
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy::Rename
    }

    fn describe(&self, locator: &String) -> String {
        match self.api.get(locator) {
            Ok(file) => format!("remote:{}", file.name),
            Err(_) => format!("remote:{}", locator),
        }
    }
}

/// In-process folder service. Useful as a stand-in for a real remote API.
#[derive(Debug)]
pub struct MemoryFolderApi {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, RemoteFile>,
    // Children in insertion order, keyed by parent id.
    children: HashMap<String, Vec<String>>,
    next_id: u64,
}

impl MemoryState {
    fn insert(&mut self, mut file: RemoteFile) -> RemoteFile {
        self.next_id += 1;
        file.id = format!("id{}", self.next_id);
        if let Some(parent) = &file.parent {
            self.children.entry(parent.clone()).or_default().push(file.id.clone());
        }
        self.files.insert(file.id.clone(), file.clone());
        file
    }
}

pub const MEMORY_ROOT_ID: &str = "root";

impl MemoryFolderApi {
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.files.insert(
            MEMORY_ROOT_ID.to_string(),
            RemoteFile {
                id: MEMORY_ROOT_ID.to_string(),
                name: "My Drive".to_string(),
                is_folder: true,
                parent: None,
                modified_time: OffsetDateTime::UNIX_EPOCH,
                image_time: None,
                created_time: None,
            },
        );
        MemoryFolderApi {
            state: Mutex::new(state),
        }
    }

    /// Add a file under `parent` and return its id.
    pub fn add_file(
        &self,
        parent: &str,
        name: &str,
        modified_time: OffsetDateTime,
        image_time: Option<OffsetDateTime>,
    ) -> String {
        self.add_remote_file(RemoteFile {
            id: String::new(),
            name: name.to_string(),
            is_folder: false,
            parent: Some(parent.to_string()),
            modified_time,
            image_time,
            created_time: None,
        })
    }

    /// Add a fully described object and return its assigned id. The `id`
    /// field of `file` is ignored.
    pub fn add_remote_file(&self, file: RemoteFile) -> String {
        self.lock().insert(file).id
    }

    /// Names of the children of `folder`, in insertion order.
    pub fn child_names(&self, folder: &str) -> Vec<String> {
        let state = self.lock();
        state
            .children
            .get(folder)
            .map(|ids| ids.iter().filter_map(|id| state.files.get(id)).map(|f| f.name.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryFolderApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFolderApi for MemoryFolderApi {
    fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let state = self.lock();
        if !state.files.contains_key(folder_id) {
            return Err(YearsortError::RemoteNotFound(folder_id.to_string()));
        }
        Ok(state
            .children
            .get(folder_id)
            .map(|ids| ids.iter().filter_map(|id| state.files.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    fn get(&self, id: &str) -> Result<RemoteFile> {
        self.lock()
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| YearsortError::RemoteNotFound(id.to_string()))
    }

    fn create_folder(&self, parent_id: &str, name: &str) -> Result<RemoteFile> {
        let mut state = self.lock();
        match state.files.get(parent_id) {
            Some(parent) if parent.is_folder => {}
            Some(_) => return Err(YearsortError::Remote(format!("{} is not a folder", parent_id))),
            None => return Err(YearsortError::RemoteNotFound(parent_id.to_string())),
        }
        let now = OffsetDateTime::now_utc();
        Ok(state.insert(RemoteFile {
            id: String::new(),
            name: name.to_string(),
            is_folder: true,
            parent: Some(parent_id.to_string()),
            modified_time: now,
            image_time: None,
            created_time: Some(now),
        }))
    }

    fn copy_file(&self, file_id: &str, new_name: &str, dest_folder_id: &str) -> Result<RemoteFile> {
        let mut state = self.lock();
        let source = state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| YearsortError::RemoteNotFound(file_id.to_string()))?;
        if !state.files.get(dest_folder_id).is_some_and(|f| f.is_folder) {
            return Err(YearsortError::RemoteNotFound(dest_folder_id.to_string()));
        }
        Ok(state.insert(RemoteFile {
            id: String::new(),
            name: new_name.to_string(),
            parent: Some(dest_folder_id.to_string()),
            ..source
        }))
    }
}
