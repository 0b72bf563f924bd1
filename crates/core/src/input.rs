//! Pointer input normalization
//!
//! Maps mouse, touch and unified pointer events from the displayed element
//! into the native pixel space of the backing image.

use crate::error::{MeasureError, MeasureResult};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Native pixel dimensions of the backing image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// On-screen rectangle of the displayed image, in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedRect {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Rect at the client origin with the given size
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// A single active touch, in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub client_x: f64,
    pub client_y: f64,
}

/// Raw pointing-device input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerInput {
    /// Mouse or unified pointer event with element-relative offsets
    Offset { x: f64, y: f64 },
    /// Touch event; only the first active touch is used
    Touch { touches: Vec<TouchPoint> },
}

impl PointerInput {
    pub fn offset(x: f64, y: f64) -> Self {
        Self::Offset { x, y }
    }

    pub fn touch(client_x: f64, client_y: f64) -> Self {
        Self::Touch { touches: vec![TouchPoint { client_x, client_y }] }
    }
}

fn check_extent(width: f64, height: f64) -> MeasureResult<()> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(MeasureError::DegenerateViewport { width, height })
    }
}

/// Converts raw pointer input into image-space points
#[derive(Debug, Clone, PartialEq)]
pub struct InputAdapter {
    native: ImageSize,
    rendered: RenderedRect,
}

impl InputAdapter {
    pub fn new(native: ImageSize, rendered: RenderedRect) -> MeasureResult<Self> {
        check_extent(native.width, native.height)?;
        check_extent(rendered.width, rendered.height)?;
        Ok(Self { native, rendered })
    }

    /// Adapter for an image displayed at its native size
    pub fn unscaled(native: ImageSize) -> MeasureResult<Self> {
        Self::new(native, RenderedRect::sized(native.width, native.height))
    }

    pub fn native_size(&self) -> ImageSize {
        self.native
    }

    pub fn rendered_rect(&self) -> RenderedRect {
        self.rendered
    }

    /// Update after a layout change (resize, scroll)
    pub fn set_rendered_rect(&mut self, rendered: RenderedRect) -> MeasureResult<()> {
        check_extent(rendered.width, rendered.height)?;
        self.rendered = rendered;
        Ok(())
    }

    /// Update after a new image is loaded
    pub fn set_native_size(&mut self, native: ImageSize) -> MeasureResult<()> {
        check_extent(native.width, native.height)?;
        self.native = native;
        Ok(())
    }

    /// Per-axis native/rendered scale factors
    pub fn scale_factors(&self) -> (f64, f64) {
        (self.native.width / self.rendered.width, self.native.height / self.rendered.height)
    }

    /// Map input to image space; `None` for a touch event with no active touch
    pub fn to_image_point(&self, input: &PointerInput) -> Option<Point> {
        let (offset_x, offset_y) = match input {
            PointerInput::Offset { x, y } => (*x, *y),
            PointerInput::Touch { touches } => {
                let touch = touches.first()?;
                (touch.client_x - self.rendered.left, touch.client_y - self.rendered.top)
            }
        };
        let (sx, sy) = self.scale_factors();
        Some(Point::new(offset_x * sx, offset_y * sy))
    }
}

/// Platform hook for suppressing default scroll and gesture handling
pub trait ScrollControl {
    fn set_scroll_suppressed(&mut self, suppressed: bool);
}

/// No-op hook for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScrollControl;

impl ScrollControl for NoScrollControl {
    fn set_scroll_suppressed(&mut self, _suppressed: bool) {}
}
