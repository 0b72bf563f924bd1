//! Replayable input scripts
//!
//! A script describes the displayed image and a sequence of UI actions and
//! pointer samples, in the order a user would produce them.

use anyhow::{Context, Result};
use areatrace_core::{
    CalibrationInput, Command, Event, ImageSize, Point, PointerInput, PointerPhase, RenderedRect,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Native image size, used when no image file is given
    #[serde(default)]
    pub image_size: Option<ImageSize>,
    /// Where the image is displayed; defaults to native size at the origin
    #[serde(default)]
    pub display: Option<RenderedRect>,
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Mouse,
    Pen,
    Touch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptEvent {
    CalibrateFrame {
        rendered_width: f64,
        #[serde(default)]
        rendered_height: Option<f64>,
    },
    CalibrateTwoPoint {
        p1: Point,
        p2: Point,
        #[serde(default)]
        known_distance: Option<f64>,
    },
    BeginCalibrating,
    BeginMeasuring,
    Undo,
    Finish,
    Abort,
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        device: Device,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        device: Device,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        device: Device,
    },
    /// Pointer down followed by pointer up at the same spot
    Click {
        x: f64,
        y: f64,
        #[serde(default)]
        device: Device,
    },
}

/// Mouse and pen report element offsets; touch reports client coordinates
fn pointer_input(x: f64, y: f64, device: Device) -> PointerInput {
    match device {
        Device::Mouse | Device::Pen => PointerInput::offset(x, y),
        Device::Touch => PointerInput::touch(x, y),
    }
}

fn pointer(phase: PointerPhase, x: f64, y: f64, device: Device) -> Event {
    Event::Pointer { phase, input: pointer_input(x, y, device) }
}

impl ScriptEvent {
    /// Controller events for this step; `default_distance` fills in a
    /// missing two-point distance
    pub fn to_events(&self, default_distance: f64) -> Vec<Event> {
        match *self {
            ScriptEvent::CalibrateFrame { rendered_width, rendered_height } => {
                let input = CalibrationInput::ReferenceFrame { rendered_width, rendered_height };
                vec![Command::Calibrate(input).into()]
            }
            ScriptEvent::CalibrateTwoPoint { p1, p2, known_distance } => {
                let known_distance = known_distance.unwrap_or(default_distance);
                let input = CalibrationInput::TwoPoint { p1, p2, known_distance };
                vec![Command::Calibrate(input).into()]
            }
            ScriptEvent::BeginCalibrating => vec![Command::BeginCalibrating.into()],
            ScriptEvent::BeginMeasuring => vec![Command::BeginMeasuring.into()],
            ScriptEvent::Undo => vec![Command::Undo.into()],
            ScriptEvent::Finish => vec![Command::Finish.into()],
            ScriptEvent::Abort => vec![Command::Abort.into()],
            ScriptEvent::PointerDown { x, y, device } => {
                vec![pointer(PointerPhase::Down, x, y, device)]
            }
            ScriptEvent::PointerMove { x, y, device } => {
                vec![pointer(PointerPhase::Move, x, y, device)]
            }
            ScriptEvent::PointerUp { x, y, device } => {
                vec![pointer(PointerPhase::Up, x, y, device)]
            }
            ScriptEvent::Click { x, y, device } => vec![
                pointer(PointerPhase::Down, x, y, device),
                pointer(PointerPhase::Up, x, y, device),
            ],
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read script {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_events() {
        let script: Script = serde_json::from_str(
            r#"{
                "image_size": {"width": 640, "height": 480},
                "display": {"width": 320, "height": 240},
                "events": [
                    {"action": "calibrate_frame", "rendered_width": 88},
                    {"action": "begin_measuring"},
                    {"action": "click", "x": 1, "y": 2},
                    {"action": "pointer_move", "x": 3, "y": 4, "device": "touch"},
                    {"action": "finish"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.image_size, Some(ImageSize::new(640.0, 480.0)));
        assert_eq!(script.display, Some(RenderedRect::sized(320.0, 240.0)));
        assert_eq!(script.events.len(), 5);
        assert_eq!(
            script.events[2],
            ScriptEvent::Click { x: 1.0, y: 2.0, device: Device::Mouse }
        );
    }

    #[test]
    fn click_expands_to_down_and_up() {
        let events = ScriptEvent::Click { x: 1.0, y: 2.0, device: Device::Pen }.to_events(1.0);
        assert_eq!(
            events,
            vec![
                Event::Pointer { phase: PointerPhase::Down, input: PointerInput::offset(1.0, 2.0) },
                Event::Pointer { phase: PointerPhase::Up, input: PointerInput::offset(1.0, 2.0) },
            ]
        );
    }

    #[test]
    fn touch_uses_client_coordinates() {
        let event = ScriptEvent::PointerDown { x: 5.0, y: 6.0, device: Device::Touch };
        let events = event.to_events(1.0);
        assert_eq!(
            events,
            vec![Event::Pointer { phase: PointerPhase::Down, input: PointerInput::touch(5.0, 6.0) }]
        );
    }

    #[test]
    fn two_point_distance_defaults_from_config() {
        let event = ScriptEvent::CalibrateTwoPoint {
            p1: Point::new(0.0, 0.0),
            p2: Point::new(10.0, 0.0),
            known_distance: None,
        };
        assert_eq!(
            event.to_events(2.5),
            vec![Event::Command(Command::Calibrate(CalibrationInput::TwoPoint {
                p1: Point::new(0.0, 0.0),
                p2: Point::new(10.0, 0.0),
                known_distance: 2.5,
            }))]
        );
    }
}
