//! Port definitions.

mod data_provider_port;
mod downloader_delegate_port;
mod network_port;
mod processor_port;
mod request_port;
mod serializer_port;

pub use data_provider_port::{DataProviderError, ImageDataProvider};
pub use downloader_delegate_port::{
    AuthenticationChallengeResponder, DefaultChallengeResponder, DefaultDownloaderDelegate,
    ImageDownloaderDelegate,
};
pub use network_port::{ChallengeDisposition, NetworkSession, TransferSink, TransportError};
pub use processor_port::{
    AnyImageModifier, GeneralProcessor, ImageModifier, ImageProcessor, ImageProcessorExt,
    same_processor,
};
pub use request_port::{AnyModifier, AnyRedirectHandler, RedirectHandler, RequestModifier};
pub use serializer_port::{DataTransformable, TransformError};

#[cfg(test)]
pub mod mocks {
    pub use super::downloader_delegate_port::MockImageDownloaderDelegate;
    pub use super::network_port::mock::ScriptedSession;
}
