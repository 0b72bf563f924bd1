//! Finished area measurements
//!
//! Geometry is kept in image pixels; real-world values are derived through
//! the scale the session was created under.

use crate::calibration::Scale;
use crate::geometry::{self, Point};
use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a measuring session
pub type SessionId = Uuid;

/// Result of finishing a traced polygon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaMeasurement {
    /// Session that produced this measurement
    pub session_id: SessionId,
    /// Unrounded area in square real-world units
    pub area: f64,
    /// Area in square image pixels
    pub area_pixels: f64,
    /// Closed perimeter in real-world units
    pub perimeter: f64,
    /// Distinct vertices (closing duplicate excluded)
    pub vertex_count: usize,
    /// Pixels per unit used for the conversion
    pub pixels_per_unit: f64,
    /// Unit of length (area is in unit²)
    pub unit: String,
    /// Where a label for this measurement should be drawn, in image space
    pub label_position: Point,
    /// Value rounded for display, e.g. `"6.00 cm²"`
    pub formatted_label: String,
}

impl AreaMeasurement {
    /// Compute from a closed polygon (first point repeated at the end)
    pub(crate) fn from_closed_polygon(
        session_id: SessionId,
        closed: &[Point],
        scale: &Scale,
    ) -> Self {
        let area_pixels = geometry::signed_area(closed).abs();
        let area = scale.to_real_area(area_pixels);
        let perimeter = scale.to_real_length(geometry::path_length(closed));

        let vertices = &closed[..closed.len().saturating_sub(1)];
        let label_position = geometry::centroid(vertices).unwrap_or(Point::new(0.0, 0.0));

        Self {
            session_id,
            area,
            area_pixels,
            perimeter,
            vertex_count: vertices.len(),
            pixels_per_unit: scale.pixels_per_unit(),
            unit: scale.unit().to_string(),
            label_position,
            formatted_label: format_area(area, scale.unit()),
        }
    }
}

/// Format an area for display with two decimals
pub fn format_area(area: f64, unit: &str) -> String {
    format!("{area:.2} {unit}²")
}
