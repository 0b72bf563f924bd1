//! Polygon geometry primitives
//!
//! Pure functions over image-space points. All coordinates share the pixel
//! space of the captured or loaded image.

use serde::{Deserialize, Serialize};

/// Image-space coordinate
///
/// Uses raster conventions:
/// - Origin (0, 0) at the top-left of the image
/// - X increases to the right
/// - Y increases downward
/// - Units are native image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Line segment between two consecutive traced points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Length in image pixels
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Signed polygon area (shoelace formula)
///
/// Positive for counter-clockwise winding in a y-up frame, negative for
/// clockwise. Fewer than three points yield `0.0`.
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(&b)
}

/// True iff the first and last points are exactly equal
pub fn is_closed(points: &[Point]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => first == last,
        _ => false,
    }
}

/// Total length of the polyline through `points`
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Mean of the vertices, used to anchor the area label
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    let n = points.len() as f64;
    Some(Point::new(sum_x / n, sum_y / n))
}
