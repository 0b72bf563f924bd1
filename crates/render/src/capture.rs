//! Backing raster for a measurement
//!
//! Supplies the image a polygon is traced over together with its native
//! pixel size. Acquisition (camera frame, file) happens outside the core.

use crate::RenderResult;
use areatrace_core::ImageSize;
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Image the user traces over
#[derive(Debug, Clone)]
pub struct CapturedImage {
    image: RgbaImage,
}

impl CapturedImage {
    /// Load from an image file (PNG or JPEG)
    pub fn open(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        log::debug!("loaded {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self { image })
    }

    /// White canvas of the given size, for headless runs
    pub fn blank(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])) }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Native size as seen by the input adapter
    pub fn size(&self) -> ImageSize {
        ImageSize::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
