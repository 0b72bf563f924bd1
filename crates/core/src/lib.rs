//! areatrace core library
//!
//! Calibrated polygon measurement: geometry, input normalization, scale
//! calibration and the measurement session state machine.

pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod input;
pub mod measurement;
pub mod session;

pub use calibration::{
    CalibrationInput, CalibrationManager, CalibrationMethod, CalibrationRatio, ReferenceFrame,
    Scale, UNCALIBRATED_RATIO,
};
pub use config::{ConfigError, MeasureConfig, OverlayStyle};
pub use controller::{Command, Controller, Event, Outcome, PointerPhase, Renderer};
pub use error::{MeasureError, MeasureResult};
pub use geometry::{Point, Segment};
pub use input::{
    ImageSize, InputAdapter, NoScrollControl, PointerInput, RenderedRect, ScrollControl, TouchPoint,
};
pub use measurement::{AreaMeasurement, SessionId};
pub use session::{MeasurementSession, SessionFrame, SessionState, MIN_POLYGON_POINTS};
