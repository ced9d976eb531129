//! Behavior that depends only on domain types.

mod image_processor;

#[cfg(test)]
pub(crate) use image_processor::fixtures;

pub use image_processor::{DEFAULT_PROCESSOR_IDENTIFIER, DefaultImageProcessor};
