//! Overlay renderer
//!
//! Redraws the background, then segments as lines and points as filled dots,
//! every time the session changes.

use crate::capture::CapturedImage;
use crate::RenderResult;
use areatrace_core::{OverlayStyle, Point, Renderer, SessionFrame};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use std::path::Path;

pub struct OverlayRenderer {
    background: RgbaImage,
    canvas: RgbaImage,
    style: OverlayStyle,
    frames: usize,
}

impl OverlayRenderer {
    pub fn new(capture: CapturedImage, style: OverlayStyle) -> Self {
        let background = capture.into_image();
        let canvas = background.clone();
        Self { background, canvas, style, frames: 0 }
    }

    /// Latest composed frame
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Number of frames drawn so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        self.canvas.save(path.as_ref())?;
        Ok(())
    }

    fn draw_point(&mut self, point: Point) {
        let radius = self.style.point_radius as i32;
        let center = (point.x.round() as i32, point.y.round() as i32);
        draw_filled_circle_mut(&mut self.canvas, center, radius, Rgba(self.style.point_color));
    }
}

impl Renderer for OverlayRenderer {
    fn render(&mut self, frame: &SessionFrame<'_>) {
        self.canvas.clone_from(&self.background);

        let line_color = Rgba(self.style.line_color);
        for segment in frame.segments {
            draw_line_segment_mut(
                &mut self.canvas,
                (segment.start.x as f32, segment.start.y as f32),
                (segment.end.x as f32, segment.end.y as f32),
                line_color,
            );
        }
        for &point in frame.points.iter().chain(frame.calibration_clicks) {
            self.draw_point(point);
        }

        self.frames += 1;
    }
}
