//! Error types for measurement operations

use crate::session::SessionState;

/// Errors surfaced by calibration, input normalization and the measurement
/// state machine. All of them are recoverable: the session stays usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("scale is not calibrated; calibrate before measuring")]
    NotCalibrated,
    #[error("invalid calibration input: {reason}")]
    InvalidCalibrationInput { reason: String },
    #[error("at least 3 points are needed to form an area (have {count})")]
    InsufficientPoints { count: usize },
    #[error("cannot {action} while {state}")]
    InvalidTransition { state: SessionState, action: &'static str },
    #[error("point ({x}, {y}) has a non-finite coordinate")]
    NonFinitePoint { x: f64, y: f64 },
    #[error("degenerate viewport {width}x{height}")]
    DegenerateViewport { width: f64, height: f64 },
}

impl MeasureError {
    pub(crate) fn invalid_calibration(reason: impl Into<String>) -> Self {
        Self::InvalidCalibrationInput { reason: reason.into() }
    }
}

pub type MeasureResult<T> = Result<T, MeasureError>;
