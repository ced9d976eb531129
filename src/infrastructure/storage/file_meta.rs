//! Time attributes of stored files.
//!
//! Each stored file carries two timestamps: the last access in `atime` and the
//! estimated expiration in `mtime`. Both are written rounded up to whole seconds.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, TimeDelta, Utc};
use filetime::FileTime;

use crate::domain::entities::{ExpirationExtending, StorageExpiration};

/// Rounds a timestamp up to the next whole second.
#[must_use]
pub fn ceil_to_second(date: DateTime<Utc>) -> DateTime<Utc> {
    if date.timestamp_subsec_nanos() == 0 {
        return date;
    }
    DateTime::from_timestamp(date.timestamp().saturating_add(1), 0).unwrap_or(date)
}

fn to_file_time(date: DateTime<Utc>) -> FileTime {
    let date = ceil_to_second(date);
    FileTime::from_unix_time(date.timestamp(), 0)
}

fn from_system_time(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Writes the last access and estimated expiration of a file.
///
/// # Errors
/// Returns error if the attributes cannot be set.
pub fn write_times(
    path: &Path,
    last_access: DateTime<Utc>,
    estimated_expiration: DateTime<Utc>,
) -> io::Result<()> {
    filetime::set_file_times(
        path,
        to_file_time(last_access),
        to_file_time(estimated_expiration),
    )
}

/// Attributes of one stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Location of the file.
    pub path: PathBuf,
    /// When the value was last stored or accessed.
    pub last_access: Option<DateTime<Utc>>,
    /// When the value expires.
    pub estimated_expiration: Option<DateTime<Utc>>,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Size in bytes.
    pub file_size: u64,
}

impl FileMeta {
    /// Reads the attributes of `path`, following symlinks.
    ///
    /// # Errors
    /// Returns error if the metadata cannot be read.
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            last_access: metadata.accessed().ok().map(from_system_time),
            estimated_expiration: metadata.modified().ok().map(from_system_time),
            is_directory: metadata.is_dir(),
            file_size: metadata.len(),
        })
    }

    /// Returns true if the estimated expiration is missing or not after `reference`.
    #[must_use]
    pub fn is_expired_at(&self, reference: DateTime<Utc>) -> bool {
        self.estimated_expiration
            .is_none_or(|expiration| expiration <= reference)
    }

    /// Computes the new estimated expiration for an access at `now`.
    ///
    /// Returns `None` when the attributes should stay untouched.
    #[must_use]
    pub fn extended_expiration(
        &self,
        extending: ExpirationExtending,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match extending {
            ExpirationExtending::None => None,
            ExpirationExtending::CacheTime => {
                let last_access = self.last_access?;
                let expiration = self.estimated_expiration?;
                let lifetime: TimeDelta = expiration - last_access;
                Some(StorageExpiration::Seconds(lifetime.num_seconds()).estimated_expiration_since(now))
            }
            ExpirationExtending::ExpirationTime(policy) => {
                Some(policy.estimated_expiration_since(now))
            }
        }
    }

    /// Rewrites the time attributes after an access.
    ///
    /// # Errors
    /// Returns error if the attributes cannot be set.
    pub fn extend_expiration(&self, extending: ExpirationExtending) -> io::Result<()> {
        let now = Utc::now();
        match self.extended_expiration(extending, now) {
            Some(expiration) => write_times(&self.path, now, expiration),
            None => Ok(()),
        }
    }
}

/// Orders metas by last access, most recent first. Missing dates sort last.
pub fn by_last_access_descending(lhs: &FileMeta, rhs: &FileMeta) -> std::cmp::Ordering {
    rhs.last_access.cmp(&lhs.last_access)
}
