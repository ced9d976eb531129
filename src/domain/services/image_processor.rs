//! Default processor that decodes downloaded bytes into an image.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::domain::entities::{ImageArtifact, ImageCreatingOptions, ProcessItem};
use crate::domain::ports::ImageProcessor;

/// Identifier of [`DefaultImageProcessor`].
pub const DEFAULT_PROCESSOR_IDENTIFIER: &str = "";

/// Decodes raw data with the `image` crate and passes decoded images through.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImageProcessor;

impl ImageProcessor for DefaultImageProcessor {
    fn identifier(&self) -> &str {
        DEFAULT_PROCESSOR_IDENTIFIER
    }

    fn process(
        &self,
        item: ProcessItem,
        options: &ImageCreatingOptions,
    ) -> Option<Arc<ImageArtifact>> {
        match item {
            ProcessItem::Image(image) => Some(image),
            ProcessItem::Data(data) => {
                let format = image::guess_format(&data).ok();
                match image::load_from_memory(&data) {
                    Ok(decoded) => {
                        trace!(
                            width = decoded.width(),
                            height = decoded.height(),
                            "Decoded image data"
                        );
                        let mut artifact = ImageArtifact::new(decoded).with_scale(options.scale);
                        artifact.format = format;
                        artifact.duration = options.duration;
                        Some(Arc::new(artifact))
                    }
                    Err(e) => {
                        warn!(size = data.len(), error = %e, "Failed to decode image data");
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    /// Encodes a solid PNG of the given size.
    pub fn png(width: u32, height: u32) -> Bytes {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }
}
