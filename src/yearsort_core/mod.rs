pub mod cli;
pub mod error;
pub mod exif;
pub mod local;
pub mod media;
pub mod organize;
pub mod photo;
pub mod probe;
pub mod remote;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod storage;
pub mod workers;

pub use cli::{Cli, Commands};
pub use error::{Result, YearsortError};
pub use local::LocalBackend;
pub use organize::{CancelToken, DEFAULT_DESTINATION_NAME, OrganizeOptions, Organizer};
pub use photo::{AssetRef, CaptureYear};
pub use probe::{ExifToolProbe, MetadataProbe};
pub use remote::{MemoryFolderApi, RemoteBackend, RemoteFile, RemoteFolderApi};
pub use report::{OrganizationResult, ProgressEvent};
pub use resolver::{Lookup, Resolution, Resolver, YearSource};
pub use storage::{DuplicatePolicy, Entry, Stat, StorageBackend};
