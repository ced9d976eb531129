//! Persistent storage of downloaded data.

mod disk_storage;
mod file_meta;

pub use disk_storage::{CACHE_NAMESPACE, CachePathFn, DiskStorage, DiskStorageConfig};
pub use file_meta::FileMeta;
