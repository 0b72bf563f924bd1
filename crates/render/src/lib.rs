//! areatrace render library
//!
//! Draws measurement session state over the captured image.

pub mod capture;
pub mod overlay;

pub use capture::CapturedImage;
pub use overlay::OverlayRenderer;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
