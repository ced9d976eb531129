//! Conversion between stored values and bytes.

use bytes::Bytes;
use thiserror::Error;

/// Failure converting a value to or from bytes.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

/// Types that can be written to and read back from disk storage.
pub trait DataTransformable: Sized {
    /// Serializes the value.
    ///
    /// # Errors
    /// Returns error if the value cannot be represented as bytes.
    fn to_data(&self) -> Result<Bytes, TransformError>;

    /// Deserializes a value.
    ///
    /// # Errors
    /// Returns error if the bytes do not describe a value.
    fn from_data(data: Bytes) -> Result<Self, TransformError>;

    /// Placeholder returned when presence is checked without loading the value.
    fn empty() -> Self;
}

impl DataTransformable for Bytes {
    fn to_data(&self) -> Result<Bytes, TransformError> {
        Ok(self.clone())
    }

    fn from_data(data: Bytes) -> Result<Self, TransformError> {
        Ok(data)
    }

    fn empty() -> Self {
        Self::new()
    }
}

impl DataTransformable for Vec<u8> {
    fn to_data(&self) -> Result<Bytes, TransformError> {
        Ok(Bytes::copy_from_slice(self))
    }

    fn from_data(data: Bytes) -> Result<Self, TransformError> {
        Ok(data.to_vec())
    }

    fn empty() -> Self {
        Self::new()
    }
}
