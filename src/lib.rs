//! Halcyon - an image loading client.
//!
//! Concurrent requests for the same URL share one network transfer whose
//! result is fanned out to every waiter, and downloaded data can be kept in a
//! size-bounded disk cache with per-entry expiration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the download pipeline and its DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for disk, network and decoding.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "halcyon";
