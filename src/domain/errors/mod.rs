//! Domain error types.

mod halcyon_error;
mod process_error;
mod request_error;
mod response_error;
mod storage_error;

pub use halcyon_error::HalcyonError;
pub use process_error::ProcessError;
pub use request_error::RequestError;
pub use response_error::ResponseError;
pub use storage_error::StorageError;
