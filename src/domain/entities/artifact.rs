//! Domain types for decoded images and image resources.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;

/// A decoded image together with the metadata collected while decoding it.
#[derive(Debug, Clone)]
pub struct ImageArtifact {
    /// Decoded pixels.
    pub image: image::DynamicImage,
    /// Container format the image was decoded from, if known.
    pub format: Option<image::ImageFormat>,
    /// Scale factor the image was created for.
    pub scale: f32,
    /// Number of frames for animated sources, `1` for still images.
    pub frame_count: usize,
    /// Total animation duration, `None` for still images.
    pub duration: Option<Duration>,
}

impl ImageArtifact {
    /// Wraps a decoded image with default metadata.
    #[must_use]
    pub fn new(image: image::DynamicImage) -> Self {
        Self {
            image,
            format: None,
            scale: 1.0,
            frame_count: 1,
            duration: None,
        }
    }

    /// Sets the source format.
    #[must_use]
    pub const fn with_format(mut self, format: image::ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the scale factor.
    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns true if the source carried more than one frame.
    #[must_use]
    pub const fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Options that influence how an image is created from raw data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCreatingOptions {
    /// Target scale of the created image.
    pub scale: f32,
    /// Expected animation duration if an animated image is created.
    pub duration: Option<Duration>,
    /// For animated images, whether every frame should be loaded up front.
    pub preload_all: bool,
    /// For animated images, whether only the first frame should be loaded.
    pub only_first_frame: bool,
}

impl Default for ImageCreatingOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            duration: None,
            preload_all: false,
            only_first_frame: false,
        }
    }
}

/// Input handed to an image processor.
#[derive(Debug, Clone)]
pub enum ProcessItem {
    /// An already decoded image.
    Image(Arc<ImageArtifact>),
    /// Raw downloaded bytes.
    Data(Bytes),
}

impl std::fmt::Display for ProcessItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(image) => write!(f, "image {}x{}", image.width(), image.height()),
            Self::Data(data) => write!(f, "data ({} bytes)", data.len()),
        }
    }
}

/// An image at a download URL, cached under a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageResource {
    /// Where the image is downloaded from.
    pub download_url: Url,
    /// The key the image is cached under.
    pub cache_key: String,
}

impl ImageResource {
    /// Creates a resource; the cache key defaults to the full URL string.
    #[must_use]
    pub fn new(download_url: Url, cache_key: Option<String>) -> Self {
        let cache_key = cache_key.unwrap_or_else(|| download_url.as_str().to_owned());
        Self {
            download_url,
            cache_key,
        }
    }
}

impl From<Url> for ImageResource {
    fn from(url: Url) -> Self {
        Self::new(url, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key_defaults_to_url() {
        let url = Url::parse("https://example.com/image.png?size=2").unwrap();
        let resource = ImageResource::from(url);
        assert_eq!(resource.cache_key, "https://example.com/image.png?size=2");
    }

    #[test]
    fn test_resource_custom_key() {
        let url = Url::parse("https://example.com/image.png").unwrap();
        let resource = ImageResource::new(url, Some("avatar-42".to_string()));
        assert_eq!(resource.cache_key, "avatar-42");
    }

    #[test]
    fn test_process_item_display() {
        let item = ProcessItem::Data(Bytes::from_static(b"abc"));
        assert_eq!(item.to_string(), "data (3 bytes)");

        let artifact = ImageArtifact::new(image::DynamicImage::new_rgb8(4, 2));
        assert_eq!(ProcessItem::Image(Arc::new(artifact)).to_string(), "image 4x2");
    }
}
