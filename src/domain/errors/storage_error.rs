//! Disk storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Disk storage error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum StorageError {
    #[error("cannot create storage directory {}: {message}", path.display())]
    CannotCreateDirectory { path: PathBuf, message: String },

    #[error("cannot start metadata queue {name}: {message}")]
    CannotStartMetadataQueue { name: String, message: String },

    #[error("cannot enumerate storage directory {}: {message}", path.display())]
    FileEnumerationFailed { path: PathBuf, message: String },

    #[error("cannot read metadata of {} for key {key}: {message}", path.display())]
    InvalidResourceMetadata {
        key: String,
        path: PathBuf,
        message: String,
    },

    #[error("cannot load data from {}: {message}", path.display())]
    CannotLoadDataFromDisk { path: PathBuf, message: String },

    #[error("cannot convert value for key {key} to data: {message}")]
    CannotConvertToData { key: String, message: String },

    #[error("cannot write {}: {message}", path.display())]
    CannotWriteFile { path: PathBuf, message: String },

    #[error("cannot remove {}: {message}", path.display())]
    CannotRemoveFile { path: PathBuf, message: String },
}

impl StorageError {
    /// Returns the file or directory the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::CannotCreateDirectory { path, .. }
            | Self::FileEnumerationFailed { path, .. }
            | Self::InvalidResourceMetadata { path, .. }
            | Self::CannotLoadDataFromDisk { path, .. }
            | Self::CannotWriteFile { path, .. }
            | Self::CannotRemoveFile { path, .. } => Some(path),
            Self::CannotConvertToData { .. } | Self::CannotStartMetadataQueue { .. } => None,
        }
    }
}
