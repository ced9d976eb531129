//! Disk storage that keeps one file per key with expiration kept in file attributes.

use std::fmt;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use super::file_meta::{self, FileMeta, by_last_access_descending};
use crate::domain::dispatch::DispatchQueue;
use crate::domain::entities::{ExpirationExtending, StorageExpiration};
use crate::domain::errors::StorageError;
use crate::domain::ports::DataTransformable;

/// Prefix of every storage directory name.
pub const CACHE_NAMESPACE: &str = "dev.halcyon.ImageCache";

/// Builds the storage directory from a base directory and the namespaced cache name.
pub type CachePathFn = Arc<dyn Fn(&Path, &str) -> PathBuf + Send + Sync>;

/// Configuration of a [`DiskStorage`].
#[derive(Clone)]
pub struct DiskStorageConfig {
    /// Name of the storage, appended to [`CACHE_NAMESPACE`].
    pub name: String,
    /// Size limit in bytes. `0` disables size based eviction.
    pub size_limit: u64,
    /// Expiration used when `store` is called without one.
    pub expiration: StorageExpiration,
    /// How expiration is extended when a value is loaded.
    pub expiration_extending: ExpirationExtending,
    /// Extension appended to stored file names.
    pub path_extension: Option<String>,
    /// Whether file names are a hash of the key instead of the key itself.
    pub uses_hashed_file_name: bool,
    /// Base directory. Defaults to the user cache directory.
    pub directory: Option<PathBuf>,
    /// Joins the base directory and cache name.
    pub cache_path: CachePathFn,
}

impl DiskStorageConfig {
    /// Creates a config with default expiration and file naming.
    #[must_use]
    pub fn new(name: impl Into<String>, size_limit: u64) -> Self {
        Self {
            name: name.into(),
            size_limit,
            expiration: StorageExpiration::default(),
            expiration_extending: ExpirationExtending::default(),
            path_extension: None,
            uses_hashed_file_name: true,
            directory: None,
            cache_path: Arc::new(|base, cache_name| base.join(cache_name)),
        }
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Sets the default expiration.
    #[must_use]
    pub const fn with_expiration(mut self, expiration: StorageExpiration) -> Self {
        self.expiration = expiration;
        self
    }
}

impl fmt::Debug for DiskStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskStorageConfig")
            .field("name", &self.name)
            .field("size_limit", &self.size_limit)
            .field("expiration", &self.expiration)
            .field("expiration_extending", &self.expiration_extending)
            .field("path_extension", &self.path_extension)
            .field("uses_hashed_file_name", &self.uses_hashed_file_name)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// Returns the default base directory for storages.
fn default_base_directory() -> PathBuf {
    directories::ProjectDirs::from("dev", "halcyon", "halcyon").map_or_else(
        || std::env::temp_dir().join("halcyon").join("cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

fn catch_not_found<F, R>(f: F) -> io::Result<Option<R>>
where
    F: FnOnce() -> io::Result<R>,
{
    match f() {
        Ok(x) => Ok(Some(x)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn collect_entries(directory: &Path, into: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        let is_dir = entry.file_type()?.is_dir();
        into.push(path.clone());
        if is_dir {
            collect_entries(&path, into)?;
        }
    }
    Ok(())
}

/// Stores values of type `T` as files under one directory.
///
/// The last access of each entry is kept in the file's access time and the
/// estimated expiration in its modification time.
pub struct DiskStorage<T> {
    config: DiskStorageConfig,
    directory: PathBuf,
    meta_queue: DispatchQueue,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DataTransformable> DiskStorage<T> {
    /// Creates the storage and its directory.
    ///
    /// # Errors
    /// Returns error if the metadata queue cannot be started or the directory
    /// cannot be created.
    pub fn new(config: DiskStorageConfig) -> Result<Self, StorageError> {
        let base = config
            .directory
            .clone()
            .unwrap_or_else(default_base_directory);
        let cache_name = format!("{CACHE_NAMESPACE}.{}", config.name);
        let directory = (config.cache_path)(&base, &cache_name);

        let meta_queue = DispatchQueue::new(cache_name.clone())
            .map_err(|e| metadata_queue_error(&cache_name, &e))?;

        let storage = Self {
            config,
            directory,
            meta_queue,
            _marker: PhantomData,
        };
        storage.prepare_directory()?;

        debug!(directory = %storage.directory.display(), "Disk storage ready");
        Ok(storage)
    }

    fn prepare_directory(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory).map_err(|e| StorageError::CannotCreateDirectory {
            path: self.directory.clone(),
            message: e.to_string(),
        })
    }

    /// The directory values are stored in.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &DiskStorageConfig {
        &self.config
    }

    /// Stores `value` under `key`.
    ///
    /// Uses the configured expiration when `expiration` is `None`. A policy that
    /// is already expired stores nothing.
    ///
    /// # Errors
    /// Returns error if the value cannot be serialized or the file cannot be written.
    pub fn store(
        &self,
        value: &T,
        key: &str,
        expiration: Option<StorageExpiration>,
    ) -> Result<(), StorageError> {
        let expiration = expiration.unwrap_or(self.config.expiration);
        if expiration.is_expired() {
            debug!(key = %key, "Expiration already passed, skipping store");
            return Ok(());
        }

        let data = value
            .to_data()
            .map_err(|e| StorageError::CannotConvertToData {
                key: key.to_owned(),
                message: e.to_string(),
            })?;

        let path = self.cache_file_path(key);
        let now = Utc::now();
        let write_error = |e: io::Error| StorageError::CannotWriteFile {
            path: path.clone(),
            message: e.to_string(),
        };
        fs::write(&path, &data).map_err(write_error)?;
        file_meta::write_times(&path, now, expiration.estimated_expiration_since(now))
            .map_err(write_error)?;

        trace!(key = %key, path = %path.display(), size = data.len(), "Stored value on disk");
        Ok(())
    }

    /// Loads the value for `key` as seen at `reference`.
    ///
    /// Returns `Ok(None)` if there is no entry or it is expired at `reference`.
    /// With `actually_load` false, a live entry yields [`DataTransformable::empty`]
    /// without reading the file. A successful load schedules an expiration
    /// extension on the background metadata queue.
    ///
    /// # Errors
    /// Returns error if the entry's metadata cannot be read, or its content
    /// cannot be read or deserialized.
    pub fn value(
        &self,
        key: &str,
        reference: DateTime<Utc>,
        actually_load: bool,
    ) -> Result<Option<T>, StorageError> {
        let path = self.cache_file_path(key);
        let meta = match catch_not_found(|| FileMeta::read(&path)) {
            Ok(Some(meta)) => meta,
            Ok(None) => return Ok(None),
            Err(e) => {
                return Err(StorageError::InvalidResourceMetadata {
                    key: key.to_owned(),
                    path,
                    message: e.to_string(),
                });
            }
        };

        if meta.is_expired_at(reference) {
            trace!(key = %key, "Disk entry expired");
            return Ok(None);
        }
        if !actually_load {
            return Ok(Some(T::empty()));
        }

        let load_error = |message: String| StorageError::CannotLoadDataFromDisk {
            path: path.clone(),
            message,
        };
        let data = fs::read(&path).map_err(|e| load_error(e.to_string()))?;
        let value = T::from_data(Bytes::from(data)).map_err(|e| load_error(e.to_string()))?;

        let extending = self.config.expiration_extending;
        self.meta_queue.execute(move || {
            if let Err(e) = meta.extend_expiration(extending) {
                warn!(path = %meta.path.display(), error = %e, "Failed to extend expiration");
            }
        });

        trace!(key = %key, "Disk storage hit");
        Ok(Some(value))
    }

    /// Returns true if a live entry for `key` exists at `reference`. Errors count as absent.
    #[must_use]
    pub fn is_cached(&self, key: &str, reference: DateTime<Utc>) -> bool {
        matches!(self.value(key, reference, false), Ok(Some(_)))
    }

    /// Removes the entry for `key`, if any.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_file(&self.cache_file_path(key))
    }

    fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        catch_not_found(|| fs::remove_file(path))
            .map(|_| ())
            .map_err(|e| StorageError::CannotRemoveFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Removes every entry and recreates the directory.
    ///
    /// # Errors
    /// Returns error if the directory cannot be removed or recreated.
    pub fn remove_all(&self) -> Result<(), StorageError> {
        self.remove_all_skipping_directory(false)
    }

    /// Removes every entry, recreating the directory unless `skip_creating_directory`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be removed or recreated.
    pub fn remove_all_skipping_directory(
        &self,
        skip_creating_directory: bool,
    ) -> Result<(), StorageError> {
        catch_not_found(|| fs::remove_dir_all(&self.directory)).map_err(|e| {
            StorageError::CannotRemoveFile {
                path: self.directory.clone(),
                message: e.to_string(),
            }
        })?;
        debug!(directory = %self.directory.display(), "Removed all disk entries");
        if !skip_creating_directory {
            self.prepare_directory()?;
        }
        Ok(())
    }

    fn all_file_paths(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut paths = Vec::new();
        collect_entries(&self.directory, &mut paths).map_err(|e| {
            StorageError::FileEnumerationFailed {
                path: self.directory.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(paths)
    }

    /// Removes every entry expired at `reference` and returns their paths.
    ///
    /// Entries whose metadata cannot be read are treated as expired.
    ///
    /// # Errors
    /// Returns error if the directory cannot be enumerated or a file cannot be removed.
    pub fn remove_expired_values(
        &self,
        reference: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        let expired: Vec<PathBuf> = self
            .all_file_paths()?
            .into_iter()
            .filter(|path| match FileMeta::read(path) {
                Ok(meta) => !meta.is_directory && meta.is_expired_at(reference),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Unreadable metadata, treating as expired");
                    true
                }
            })
            .collect();

        for path in &expired {
            self.remove_file(path)?;
        }

        debug!(count = expired.len(), "Removed expired disk entries");
        Ok(expired)
    }

    /// Evicts least recently accessed entries once the size limit is reached.
    ///
    /// Eviction stops when the total size is at most half the limit.
    ///
    /// # Errors
    /// Returns error if the directory cannot be enumerated or a file cannot be removed.
    pub fn remove_size_exceeded_values(&self) -> Result<Vec<PathBuf>, StorageError> {
        let limit = self.config.size_limit;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut size = self.total_size()?;
        if size < limit {
            return Ok(Vec::new());
        }

        let mut pendings: Vec<FileMeta> = self
            .all_file_paths()?
            .iter()
            .filter_map(|path| FileMeta::read(path).ok())
            .filter(|meta| !meta.is_directory)
            .collect();
        pendings.sort_by(by_last_access_descending);

        let target = limit / 2;
        let mut removed = Vec::new();
        while size > target {
            let Some(meta) = pendings.pop() else {
                break;
            };
            size = size.saturating_sub(meta.file_size);
            self.remove_file(&meta.path)?;
            removed.push(meta.path);
        }

        debug!(
            count = removed.len(),
            remaining = size,
            limit = limit,
            "Evicted disk entries over size limit"
        );
        Ok(removed)
    }

    /// Sums the sizes of all stored files.
    ///
    /// # Errors
    /// Returns error if the directory cannot be enumerated.
    pub fn total_size(&self) -> Result<u64, StorageError> {
        Ok(self
            .all_file_paths()?
            .iter()
            .filter_map(|path| FileMeta::read(path).ok())
            .filter(|meta| !meta.is_directory)
            .map(|meta| meta.file_size)
            .sum())
    }

    /// Path of the file `key` is stored in, whether or not it exists.
    #[must_use]
    pub fn cache_file_path(&self, key: &str) -> PathBuf {
        self.directory.join(self.cache_file_name(key))
    }

    /// File name used for `key`.
    #[must_use]
    pub fn cache_file_name(&self, key: &str) -> String {
        let name = if self.config.uses_hashed_file_name {
            hashed_key(key)
        } else {
            key.to_owned()
        };
        match &self.config.path_extension {
            Some(ext) => format!("{name}.{ext}"),
            None => name,
        }
    }

    /// Blocks until pending expiration extensions have been written.
    pub fn flush_metadata(&self) {
        self.meta_queue.wait_until_idle();
    }
}

fn hashed_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

impl<T> fmt::Debug for DiskStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskStorage")
            .field("directory", &self.directory)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn metadata_queue_error(cache_name: &str, error: &io::Error) -> StorageError {
    StorageError::CannotStartMetadataQueue {
        name: cache_name.to_owned(),
        message: error.to_string(),
    }
}
