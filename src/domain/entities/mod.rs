//! Domain entity definitions.

mod artifact;
mod expiration;
mod transfer;

pub use artifact::{ImageArtifact, ImageCreatingOptions, ImageResource, ProcessItem};
pub use expiration::{ExpirationExtending, StorageExpiration, distant_future, distant_past};
pub use transfer::{CancelToken, DownloadRequest, ResponseMeta};
