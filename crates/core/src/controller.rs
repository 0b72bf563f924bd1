//! Single-actor event loop
//!
//! Routes UI commands and pointer events into the session in arrival order,
//! redraws after every change and keeps scroll suppression enabled exactly
//! while the session is measuring.

use crate::calibration::{CalibrationInput, CalibrationRatio};
use crate::error::MeasureResult;
use crate::input::{InputAdapter, PointerInput, ScrollControl};
use crate::measurement::AreaMeasurement;
use crate::session::{MeasurementSession, SessionFrame, SessionState};
use serde::{Deserialize, Serialize};

/// Draws the current session state; produces nothing back
pub trait Renderer {
    fn render(&mut self, frame: &SessionFrame<'_>);
}

/// UI actions ("calibrate", "begin measuring", "undo", "finish", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Calibrate(CalibrationInput),
    BeginCalibrating,
    BeginMeasuring,
    Undo,
    Finish,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Pointer { phase: PointerPhase, input: PointerInput },
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Event::Command(command)
    }
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Session state changed
    Updated,
    /// Event had no effect in the current state
    Ignored,
    Calibrated(CalibrationRatio),
    Finished(AreaMeasurement),
}

/// Owns the session and its collaborators
pub struct Controller<R, S> {
    session: MeasurementSession,
    adapter: InputAdapter,
    renderer: R,
    scroll: S,
    scroll_suppressed: bool,
    stroke_active: bool,
    drag_tracing: bool,
}

impl<R: Renderer, S: ScrollControl> Controller<R, S> {
    pub fn new(session: MeasurementSession, adapter: InputAdapter, renderer: R, scroll: S) -> Self {
        Self {
            session,
            adapter,
            renderer,
            scroll,
            scroll_suppressed: false,
            stroke_active: false,
            drag_tracing: true,
        }
    }

    /// Add points on pointer moves while the pointer is held
    pub fn with_drag_tracing(mut self, enabled: bool) -> Self {
        self.drag_tracing = enabled;
        self
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn adapter_mut(&mut self) -> &mut InputAdapter {
        &mut self.adapter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn scroll_control(&self) -> &S {
        &self.scroll
    }

    pub fn is_scroll_suppressed(&self) -> bool {
        self.scroll_suppressed
    }

    /// Process one event to completion
    pub fn handle(&mut self, event: impl Into<Event>) -> MeasureResult<Outcome> {
        let result = match event.into() {
            Event::Command(command) => self.handle_command(command),
            Event::Pointer { phase, input } => self.handle_pointer(phase, &input),
        };

        if !matches!(result, Ok(Outcome::Ignored)) {
            self.renderer.render(&self.session.frame());
        }
        self.sync_scroll();
        result
    }

    pub fn pointer(&mut self, phase: PointerPhase, input: PointerInput) -> MeasureResult<Outcome> {
        self.handle(Event::Pointer { phase, input })
    }

    fn handle_command(&mut self, command: Command) -> MeasureResult<Outcome> {
        self.stroke_active = false;
        match command {
            Command::Calibrate(input) => self.session.calibrate(input).map(Outcome::Calibrated),
            Command::BeginCalibrating => {
                self.session.begin_calibrating().map(|()| Outcome::Updated)
            }
            Command::BeginMeasuring => self.session.begin_measuring().map(|()| Outcome::Updated),
            Command::Undo => match self.session.undo()? {
                Some(_) => Ok(Outcome::Updated),
                None => Ok(Outcome::Ignored),
            },
            Command::Finish => self.session.finish().map(Outcome::Finished),
            Command::Abort => {
                if self.session.state() != SessionState::Measuring {
                    return Ok(Outcome::Ignored);
                }
                self.session.abort();
                Ok(Outcome::Updated)
            }
        }
    }

    fn handle_pointer(
        &mut self,
        phase: PointerPhase,
        input: &PointerInput,
    ) -> MeasureResult<Outcome> {
        let state = self.session.state();
        if phase == PointerPhase::Up {
            self.stroke_active = false;
            return Ok(Outcome::Ignored);
        }
        let Some(point) = self.adapter.to_image_point(input) else {
            return Ok(Outcome::Ignored);
        };

        match (state, phase) {
            (SessionState::Calibrating, PointerPhase::Down) => {
                match self.session.add_calibration_point(point)? {
                    Some(ratio) => Ok(Outcome::Calibrated(ratio)),
                    None => Ok(Outcome::Updated),
                }
            }
            (SessionState::Measuring, PointerPhase::Down) => {
                self.session.add_point(point)?;
                self.stroke_active = true;
                Ok(Outcome::Updated)
            }
            (SessionState::Measuring, PointerPhase::Move)
                if self.stroke_active && self.drag_tracing =>
            {
                self.session.add_point(point)?;
                Ok(Outcome::Updated)
            }
            _ => Ok(Outcome::Ignored),
        }
    }

    fn sync_scroll(&mut self) {
        let wanted = self.session.state() == SessionState::Measuring;
        if wanted != self.scroll_suppressed {
            self.scroll.set_scroll_suppressed(wanted);
            self.scroll_suppressed = wanted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationManager, ReferenceFrame};
    use crate::error::MeasureError;
    use crate::geometry::Point;
    use crate::input::{ImageSize, RenderedRect};

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(SessionState, usize, usize)>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, frame: &SessionFrame<'_>) {
            self.frames.push((frame.state, frame.points.len(), frame.segments.len()));
        }
    }

    #[derive(Default)]
    struct RecordingScroll {
        calls: Vec<bool>,
    }

    impl ScrollControl for RecordingScroll {
        fn set_scroll_suppressed(&mut self, suppressed: bool) {
            self.calls.push(suppressed);
        }
    }

    fn controller() -> Controller<RecordingRenderer, RecordingScroll> {
        let session = MeasurementSession::new(CalibrationManager::new(
            ReferenceFrame { real_width: 8.8, real_height: None },
            1.0,
            "cm",
        ));
        let adapter = InputAdapter::new(
            ImageSize::new(640.0, 480.0),
            RenderedRect::sized(320.0, 240.0),
        )
        .unwrap();
        Controller::new(session, adapter, RecordingRenderer::default(), RecordingScroll::default())
    }

    fn calibrate_frame() -> Command {
        Command::Calibrate(CalibrationInput::ReferenceFrame {
            rendered_width: 8.8,
            rendered_height: None,
        })
    }

    fn click(c: &mut Controller<RecordingRenderer, RecordingScroll>, x: f64, y: f64) {
        c.pointer(PointerPhase::Down, PointerInput::offset(x, y)).unwrap();
        c.pointer(PointerPhase::Up, PointerInput::offset(x, y)).unwrap();
    }

    #[test]
    fn test_full_measurement_flow() {
        let mut c = controller();
        assert_eq!(c.handle(Command::BeginMeasuring), Err(MeasureError::NotCalibrated));

        assert!(matches!(c.handle(calibrate_frame()).unwrap(), Outcome::Calibrated(_)));
        c.handle(Command::BeginMeasuring).unwrap();

        // Rendered at half size: offsets double into image space
        click(&mut c, 0.0, 0.0);
        click(&mut c, 2.0, 0.0);
        click(&mut c, 2.0, 1.5);
        assert_eq!(c.session().points()[2], Point::new(4.0, 3.0));

        let Outcome::Finished(measurement) = c.handle(Command::Finish).unwrap() else {
            panic!("expected a finished measurement");
        };
        assert_eq!(measurement.area, 6.0);
        assert_eq!(c.session().state(), SessionState::Finished);
    }

    #[test]
    fn test_scroll_suppressed_only_while_measuring() {
        let mut c = controller();
        c.handle(calibrate_frame()).unwrap();
        assert!(c.scroll_control().calls.is_empty());

        c.handle(Command::BeginMeasuring).unwrap();
        assert!(c.is_scroll_suppressed());
        click(&mut c, 1.0, 1.0);
        c.handle(Command::Undo).unwrap();
        assert_eq!(c.scroll_control().calls, vec![true]);

        c.handle(Command::Abort).unwrap();
        assert!(!c.is_scroll_suppressed());

        c.handle(Command::BeginMeasuring).unwrap();
        for (x, y) in [(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)] {
            click(&mut c, x, y);
        }
        c.handle(Command::Finish).unwrap();
        assert_eq!(c.scroll_control().calls, vec![true, false, true, false]);
    }

    #[test]
    fn test_failed_finish_keeps_scroll_suppressed() {
        let mut c = controller();
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();
        click(&mut c, 1.0, 1.0);

        assert_eq!(c.handle(Command::Finish), Err(MeasureError::InsufficientPoints { count: 1 }));
        assert!(c.is_scroll_suppressed());
        assert_eq!(c.session().state(), SessionState::Measuring);
    }

    #[test]
    fn test_recalibration_rejected_mid_trace() {
        let mut c = controller();
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();
        click(&mut c, 1.0, 1.0);

        assert!(matches!(
            c.handle(Command::BeginCalibrating),
            Err(MeasureError::InvalidTransition { state: SessionState::Measuring, .. })
        ));
        assert_eq!(c.session().state(), SessionState::Measuring);
        assert_eq!(c.session().points().len(), 1);
        assert!(c.is_scroll_suppressed());
    }

    #[test]
    fn test_pointer_ignored_outside_measuring() {
        let mut c = controller();
        let outcome = c.pointer(PointerPhase::Down, PointerInput::offset(3.0, 3.0)).unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert!(c.session().points().is_empty());
        assert!(c.renderer().frames.is_empty());
    }

    #[test]
    fn test_drag_tracing_adds_points_while_held() {
        let mut c = controller();
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();

        c.pointer(PointerPhase::Move, PointerInput::offset(9.0, 9.0)).unwrap();
        assert!(c.session().points().is_empty());

        c.pointer(PointerPhase::Down, PointerInput::offset(0.0, 0.0)).unwrap();
        c.pointer(PointerPhase::Move, PointerInput::offset(1.0, 0.0)).unwrap();
        c.pointer(PointerPhase::Move, PointerInput::offset(1.0, 1.0)).unwrap();
        c.pointer(PointerPhase::Up, PointerInput::offset(1.0, 1.0)).unwrap();
        c.pointer(PointerPhase::Move, PointerInput::offset(5.0, 5.0)).unwrap();

        assert_eq!(c.session().points().len(), 3);
        assert_eq!(c.session().segments().len(), 2);
    }

    #[test]
    fn test_drag_tracing_disabled() {
        let mut c = controller().with_drag_tracing(false);
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();

        c.pointer(PointerPhase::Down, PointerInput::offset(0.0, 0.0)).unwrap();
        c.pointer(PointerPhase::Move, PointerInput::offset(1.0, 0.0)).unwrap();
        assert_eq!(c.session().points().len(), 1);
    }

    #[test]
    fn test_click_calibration_through_pointer() {
        let mut c = controller();
        c.handle(Command::BeginCalibrating).unwrap();

        let first = c.pointer(PointerPhase::Down, PointerInput::offset(0.0, 0.0)).unwrap();
        assert_eq!(first, Outcome::Updated);
        let outcome = c.pointer(PointerPhase::Down, PointerInput::offset(0.0, 5.0)).unwrap();
        // 5 rendered px = 10 image px over a known distance of 1
        assert!(matches!(outcome, Outcome::Calibrated(r) if r.pixels_per_unit() == 10.0));
        assert_eq!(c.session().state(), SessionState::Idle);
        assert!(c.session().is_calibrated());
    }

    #[test]
    fn test_renderer_sees_every_change() {
        let mut c = controller();
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();
        click(&mut c, 1.0, 1.0);
        click(&mut c, 2.0, 1.0);
        c.handle(Command::Undo).unwrap();
        // Drain the last point; undo on the empty list is not redrawn
        c.handle(Command::Undo).unwrap();
        let frames_before = c.renderer().frames.len();
        assert_eq!(c.handle(Command::Undo).unwrap(), Outcome::Ignored);
        assert_eq!(c.renderer().frames.len(), frames_before);

        assert_eq!(
            &c.renderer().frames[..5],
            &[
                (SessionState::Idle, 0, 0),
                (SessionState::Measuring, 0, 0),
                (SessionState::Measuring, 1, 0),
                (SessionState::Measuring, 2, 1),
                (SessionState::Measuring, 1, 0),
            ]
        );
    }

    #[test]
    fn test_touch_input_routed_through_adapter() {
        let mut c = controller();
        c.adapter_mut().set_rendered_rect(RenderedRect::new(10.0, 20.0, 320.0, 240.0)).unwrap();
        c.handle(calibrate_frame()).unwrap();
        c.handle(Command::BeginMeasuring).unwrap();

        c.pointer(PointerPhase::Down, PointerInput::touch(15.0, 30.0)).unwrap();
        assert_eq!(c.session().points(), &[Point::new(10.0, 20.0)]);

        let outcome =
            c.pointer(PointerPhase::Down, PointerInput::Touch { touches: vec![] }).unwrap();
        assert_eq!(outcome, Outcome::Ignored);
    }
}
