//! Domain layer with core entities, errors, ports and the dispatch queues they run on.

/// Serial queues and callback delivery.
pub mod dispatch;
/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Default implementations of domain ports.
pub mod services;

pub use entities::{DownloadRequest, ImageArtifact, ResponseMeta, StorageExpiration};
pub use dispatch::{CallbackQueue, DispatchContexts, DispatchQueue};
pub use errors::HalcyonError;
pub use services::DefaultImageProcessor;
