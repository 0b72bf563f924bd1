//! Scale calibration
//!
//! Derives a pixels-per-unit ratio from a reference frame of known real size,
//! from two points a known distance apart, or from a ratio entered directly.

use crate::error::{MeasureError, MeasureResult};
use crate::geometry::{self, Point};
use serde::{Deserialize, Serialize};

/// Ratio used before any calibration is committed. Never counts as calibrated.
pub const UNCALIBRATED_RATIO: f64 = 1.0;

/// Validated pixels-per-unit ratio (finite and strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct CalibrationRatio(f64);

impl CalibrationRatio {
    pub fn new(pixels_per_unit: f64) -> MeasureResult<Self> {
        if !pixels_per_unit.is_finite() || pixels_per_unit <= 0.0 {
            return Err(MeasureError::invalid_calibration(format!(
                "ratio must be finite and positive, got {pixels_per_unit}"
            )));
        }
        Ok(Self(pixels_per_unit))
    }

    pub fn pixels_per_unit(self) -> f64 {
        self.0
    }
}

/// Real-world size of the on-screen reference frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    /// Real width in units (e.g. centimetres)
    pub real_width: f64,
    /// Real height in units, when the frame's height is also known
    #[serde(default)]
    pub real_height: Option<f64>,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        // Width of the physical calibration card
        Self { real_width: 8.8, real_height: None }
    }
}

/// Input to a calibration protocol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum CalibrationInput {
    /// Rendered pixel size of the reference frame element
    ReferenceFrame {
        rendered_width: f64,
        #[serde(default)]
        rendered_height: Option<f64>,
    },
    /// Two clicked points a known real distance apart
    TwoPoint { p1: Point, p2: Point, known_distance: f64 },
    /// Ratio entered directly (pixels per unit)
    Manual { pixels_per_unit: f64 },
}

/// How a committed scale was obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CalibrationMethod {
    ReferenceFrame { frame: ReferenceFrame, rendered_width: f64, rendered_height: Option<f64> },
    TwoPoint { p1: Point, p2: Point, known_distance: f64 },
    Manual,
}

/// A committed calibration: ratio, unit and provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scale {
    ratio: CalibrationRatio,
    unit: String,
    method: CalibrationMethod,
}

impl Scale {
    pub fn ratio(&self) -> CalibrationRatio {
        self.ratio
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.ratio.pixels_per_unit()
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn method(&self) -> &CalibrationMethod {
        &self.method
    }

    /// Convert an image-space length to real-world units
    pub fn to_real_length(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_unit()
    }

    /// Convert a real-world length to image pixels
    pub fn to_pixels(&self, real: f64) -> f64 {
        real * self.pixels_per_unit()
    }

    /// Convert an image-space area to square real-world units
    pub fn to_real_area(&self, square_pixels: f64) -> f64 {
        let ratio = self.pixels_per_unit();
        square_pixels / (ratio * ratio)
    }
}

fn positive_dimension(value: f64, what: &str) -> MeasureResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MeasureError::invalid_calibration(format!(
            "{what} must be finite and positive, got {value}"
        )))
    }
}

/// Ratio from the reference frame's rendered size.
///
/// Width-only unless both the real height is configured and a rendered
/// height is supplied, in which case both axis ratios are averaged.
pub fn reference_frame_ratio(
    frame: &ReferenceFrame,
    rendered_width: f64,
    rendered_height: Option<f64>,
) -> MeasureResult<CalibrationRatio> {
    let width_ratio = positive_dimension(rendered_width, "rendered width")?
        / positive_dimension(frame.real_width, "reference width")?;

    let ratio = match (frame.real_height, rendered_height) {
        (Some(real_height), Some(rendered_height)) => {
            let height_ratio = positive_dimension(rendered_height, "rendered height")?
                / positive_dimension(real_height, "reference height")?;
            (width_ratio + height_ratio) / 2.0
        }
        _ => width_ratio,
    };

    CalibrationRatio::new(ratio)
}

/// Ratio from two points `known_distance` units apart
pub fn two_point_ratio(
    p1: Point,
    p2: Point,
    known_distance: f64,
) -> MeasureResult<CalibrationRatio> {
    let known_distance = positive_dimension(known_distance, "known distance")?;
    let pixel_distance = geometry::distance(p1, p2);
    if pixel_distance == 0.0 {
        return Err(MeasureError::invalid_calibration("calibration points coincide"));
    }
    if !pixel_distance.is_finite() {
        return Err(MeasureError::invalid_calibration("calibration points are not finite"));
    }
    CalibrationRatio::new(pixel_distance / known_distance)
}

/// Owns the reference configuration and the committed scale
#[derive(Debug, Clone)]
pub struct CalibrationManager {
    reference_frame: ReferenceFrame,
    known_distance: f64,
    unit: String,
    scale: Option<Scale>,
    clicks: Vec<Point>,
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(ReferenceFrame::default(), 1.0, "cm")
    }
}

impl CalibrationManager {
    pub fn new(
        reference_frame: ReferenceFrame,
        known_distance: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self { reference_frame, known_distance, unit: unit.into(), scale: None, clicks: Vec::new() }
    }

    pub fn reference_frame(&self) -> &ReferenceFrame {
        &self.reference_frame
    }

    pub fn known_distance(&self) -> f64 {
        self.known_distance
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Whether a ratio has been explicitly committed
    pub fn is_calibrated(&self) -> bool {
        self.scale.is_some()
    }

    pub fn scale(&self) -> Option<&Scale> {
        self.scale.as_ref()
    }

    pub fn ratio(&self) -> Option<CalibrationRatio> {
        self.scale.as_ref().map(Scale::ratio)
    }

    /// Committed ratio, or the 1:1 guard-rail value when uncalibrated
    pub fn ratio_or_default(&self) -> f64 {
        self.ratio().map_or(UNCALIBRATED_RATIO, CalibrationRatio::pixels_per_unit)
    }

    /// Run a calibration protocol and commit its ratio.
    ///
    /// On error the previously committed scale (if any) is kept.
    pub fn calibrate(&mut self, input: CalibrationInput) -> MeasureResult<CalibrationRatio> {
        self.clicks.clear();
        let (ratio, method) = match input {
            CalibrationInput::ReferenceFrame { rendered_width, rendered_height } => (
                reference_frame_ratio(&self.reference_frame, rendered_width, rendered_height)?,
                CalibrationMethod::ReferenceFrame {
                    frame: self.reference_frame,
                    rendered_width,
                    rendered_height,
                },
            ),
            CalibrationInput::TwoPoint { p1, p2, known_distance } => (
                two_point_ratio(p1, p2, known_distance)?,
                CalibrationMethod::TwoPoint { p1, p2, known_distance },
            ),
            CalibrationInput::Manual { pixels_per_unit } => {
                (CalibrationRatio::new(pixels_per_unit)?, CalibrationMethod::Manual)
            }
        };

        log::info!("calibrated at {:.4} px/{}", ratio.pixels_per_unit(), self.unit);
        self.scale = Some(Scale { ratio, unit: self.unit.clone(), method });
        Ok(ratio)
    }

    /// Record a two-point calibration click.
    ///
    /// Returns the committed ratio once the second click arrives, using the
    /// configured known distance.
    pub fn add_click(&mut self, point: Point) -> MeasureResult<Option<CalibrationRatio>> {
        self.clicks.push(point);
        if let [p1, p2] = self.clicks[..] {
            let known_distance = self.known_distance;
            return self.calibrate(CalibrationInput::TwoPoint { p1, p2, known_distance }).map(Some);
        }
        Ok(None)
    }

    /// Pending two-point clicks
    pub fn clicks(&self) -> &[Point] {
        &self.clicks
    }

    pub fn clear_clicks(&mut self) {
        self.clicks.clear();
    }

    /// Forget the committed scale
    pub fn reset(&mut self) {
        self.scale = None;
        self.clicks.clear();
    }
}
