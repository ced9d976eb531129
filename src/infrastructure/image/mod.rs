//! Image data providers.

mod data_provider;

pub use data_provider::{
    Base64ImageDataProvider, LocalFileImageDataProvider, RawImageDataProvider,
};
