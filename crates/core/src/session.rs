//! Measurement session state machine
//!
//! ```text
//! Idle ──begin_calibrating──▶ Calibrating ──calibrate──▶ Idle (calibrated)
//! Idle ──begin_measuring──▶ Measuring ──finish──▶ Finished
//!                           Measuring ──abort──▶ Idle
//! ```
//!
//! `begin_measuring` from `Finished` (or `Measuring`) discards the previous
//! trace and starts a fresh session with a new id.

use crate::calibration::{CalibrationInput, CalibrationManager, CalibrationRatio, Scale};
use crate::error::{MeasureError, MeasureResult};
use crate::geometry::{self, Point, Segment};
use crate::measurement::{AreaMeasurement, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of traced points that can enclose an area
pub const MIN_POLYGON_POINTS: usize = 3;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Calibrating,
    Measuring,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Calibrating => "calibrating",
            SessionState::Measuring => "measuring",
            SessionState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Read-only view of the session handed to renderers
#[derive(Debug, Clone, Copy)]
pub struct SessionFrame<'a> {
    pub state: SessionState,
    pub points: &'a [Point],
    pub segments: &'a [Segment],
    /// Pending two-point calibration clicks
    pub calibration_clicks: &'a [Point],
}

/// Calibrated polygon measurement session
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    id: SessionId,
    state: SessionState,
    calibration: CalibrationManager,
    /// Scale captured at `begin_measuring`
    scale: Option<Scale>,
    points: Vec<Point>,
    segments: Vec<Segment>,
    result: Option<AreaMeasurement>,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new(CalibrationManager::default())
    }
}

impl MeasurementSession {
    pub fn new(calibration: CalibrationManager) -> Self {
        Self {
            id: SessionId::new_v4(),
            state: SessionState::Idle,
            calibration,
            scale: None,
            points: Vec::new(),
            segments: Vec::new(),
            result: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn calibration(&self) -> &CalibrationManager {
        &self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Scale the current trace is measured against
    pub fn scale(&self) -> Option<&Scale> {
        self.scale.as_ref()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Result of the last successful `finish`
    pub fn result(&self) -> Option<&AreaMeasurement> {
        self.result.as_ref()
    }

    pub fn frame(&self) -> SessionFrame<'_> {
        SessionFrame {
            state: self.state,
            points: &self.points,
            segments: &self.segments,
            calibration_clicks: self.calibration.clicks(),
        }
    }

    fn reject(&self, action: &'static str) -> MeasureError {
        log::warn!("rejected {action} while {}", self.state);
        MeasureError::InvalidTransition { state: self.state, action }
    }

    fn clear_trace(&mut self) {
        self.points.clear();
        self.segments.clear();
        self.scale = None;
    }

    /// Drop the closed polygon and result of a finished session
    fn discard_finished(&mut self) {
        if self.state == SessionState::Finished {
            log::debug!("discarding finished session {}", self.id);
            self.clear_trace();
            self.result = None;
        }
    }

    /// Enter calibration; rejected while a trace is in progress
    pub fn begin_calibrating(&mut self) -> MeasureResult<()> {
        if self.state == SessionState::Measuring {
            return Err(self.reject("begin calibrating"));
        }
        self.discard_finished();
        self.calibration.clear_clicks();
        self.state = SessionState::Calibrating;
        Ok(())
    }

    /// Commit a calibration; returns to `Idle` whether or not it succeeds
    pub fn calibrate(&mut self, input: CalibrationInput) -> MeasureResult<CalibrationRatio> {
        if self.state == SessionState::Measuring {
            return Err(self.reject("calibrate"));
        }
        self.discard_finished();
        let result = self.calibration.calibrate(input);
        self.state = SessionState::Idle;
        result
    }

    /// Record a two-point calibration click while `Calibrating`.
    ///
    /// Returns `Some(ratio)` once the second click commits the calibration.
    pub fn add_calibration_point(
        &mut self,
        point: Point,
    ) -> MeasureResult<Option<CalibrationRatio>> {
        if self.state != SessionState::Calibrating {
            return Err(self.reject("add a calibration point"));
        }
        if !point.is_finite() {
            return Err(MeasureError::NonFinitePoint { x: point.x, y: point.y });
        }
        let result = self.calibration.add_click(point);
        if !matches!(result, Ok(None)) {
            self.state = SessionState::Idle;
        }
        result
    }

    /// Start a fresh trace under the committed scale
    pub fn begin_measuring(&mut self) -> MeasureResult<()> {
        let scale = self.calibration.scale().cloned().ok_or(MeasureError::NotCalibrated)?;
        if self.state == SessionState::Measuring && !self.points.is_empty() {
            log::debug!(
                "restarting session {}, discarding {} points",
                self.id,
                self.points.len()
            );
        }

        self.id = SessionId::new_v4();
        self.points.clear();
        self.segments.clear();
        self.scale = Some(scale);
        self.result = None;
        self.calibration.clear_clicks();
        self.state = SessionState::Measuring;
        log::debug!("session {} measuring", self.id);
        Ok(())
    }

    /// Append a traced point, recording the segment from the previous point
    pub fn add_point(&mut self, point: Point) -> MeasureResult<()> {
        if self.state != SessionState::Measuring {
            return Err(self.reject("add a point"));
        }
        if !point.is_finite() {
            return Err(MeasureError::NonFinitePoint { x: point.x, y: point.y });
        }
        if let Some(&last) = self.points.last() {
            self.segments.push(Segment::new(last, point));
        }
        self.points.push(point);
        log::debug!("point {} at ({:.1}, {:.1})", self.points.len(), point.x, point.y);
        Ok(())
    }

    /// Remove the last point and the segment it added; `None` if empty
    pub fn undo(&mut self) -> MeasureResult<Option<Point>> {
        if self.state != SessionState::Measuring {
            return Err(self.reject("undo"));
        }
        let Some(point) = self.points.pop() else {
            return Ok(None);
        };
        if self.segments.len() > self.points.len().saturating_sub(1) {
            self.segments.pop();
        }
        Ok(Some(point))
    }

    /// Close the polygon and compute its real-world area
    pub fn finish(&mut self) -> MeasureResult<AreaMeasurement> {
        if self.state != SessionState::Measuring {
            return Err(self.reject("finish"));
        }
        if self.points.len() < MIN_POLYGON_POINTS {
            return Err(MeasureError::InsufficientPoints { count: self.points.len() });
        }
        let scale = self.scale.as_ref().ok_or(MeasureError::NotCalibrated)?;

        if !geometry::is_closed(&self.points) {
            let first = self.points[0];
            if let Some(&last) = self.points.last() {
                self.segments.push(Segment::new(last, first));
            }
            self.points.push(first);
        }

        let measurement = AreaMeasurement::from_closed_polygon(self.id, &self.points, scale);
        log::info!("session {} finished: {}", self.id, measurement.formatted_label);

        self.result = Some(measurement.clone());
        self.state = SessionState::Finished;
        Ok(measurement)
    }

    /// Abandon the current trace; only meaningful while `Measuring`
    pub fn abort(&mut self) {
        if self.state == SessionState::Measuring {
            log::debug!("session {} aborted", self.id);
            self.clear_trace();
            self.state = SessionState::Idle;
        }
    }
}
