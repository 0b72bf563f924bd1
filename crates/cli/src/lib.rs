use anyhow::{Context, Result};
use areatrace_core::{
    AreaMeasurement, CalibrationInput, Controller, ImageSize, InputAdapter, MeasureConfig,
    MeasurementSession, NoScrollControl, Outcome, Point, RenderedRect,
};
use areatrace_render::{CapturedImage, OverlayRenderer};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod script;

use script::Script;

#[derive(Debug, Parser)]
#[command(name = "areatrace")]
#[command(about = "Measure real-world areas traced over a calibrated image")]
pub struct Cli {
    /// Config file (defaults to $AREATRACE_CONFIG or the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay an input script and print the measured area.
    Measure {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        /// Image the script traces over (overrides the script's image_size)
        #[arg(long)]
        image: Option<PathBuf>,
        /// Write the final overlay PNG here
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Fail on the first rejected event instead of skipping it
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        json: bool,
    },
    /// Measure a polygon given directly as image-space points.
    Area {
        /// Pixels per unit length
        #[arg(long)]
        ppu: f64,
        #[arg(long)]
        json: bool,
        #[arg(
            value_name = "X,Y",
            value_parser = parse_point,
            num_args = 3..,
            required = true,
            allow_hyphen_values = true
        )]
        points: Vec<Point>,
    },
    /// Compute a calibration ratio.
    Calibrate {
        #[command(subcommand)]
        protocol: CalibrateCommand,
    },
    /// Print the effective configuration.
    Config {
        /// Write the defaults to the config path if no file exists
        #[arg(long)]
        init: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum CalibrateCommand {
    /// From the on-screen size of the reference frame.
    Frame {
        #[arg(long)]
        rendered_width: f64,
        #[arg(long)]
        rendered_height: Option<f64>,
    },
    /// From two points a known distance apart.
    TwoPoint {
        #[arg(value_name = "X,Y", value_parser = parse_point)]
        from: Point,
        #[arg(value_name = "X,Y", value_parser = parse_point)]
        to: Point,
        /// Real distance between the points (defaults to the configured value)
        #[arg(long)]
        distance: Option<f64>,
    },
}

/// Largest side of a blank canvas created from a script's `image_size`
const MAX_BLANK_SIDE: f64 = 16_384.0;

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value.split_once(',').ok_or_else(|| format!("expected X,Y, got '{value}'"))?;
    let coord = |s: &str| {
        let v = s.trim().parse::<f64>().map_err(|e| format!("invalid coordinate '{s}': {e}"))?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(format!("coordinate '{s}' is not finite"))
        }
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}

fn blank_capture(size: ImageSize) -> Result<CapturedImage> {
    let (width, height) = (size.width.round(), size.height.round());
    let in_range = |side: f64| side.is_finite() && (1.0..=MAX_BLANK_SIDE).contains(&side);
    if !in_range(width) || !in_range(height) {
        anyhow::bail!(
            "script image_size {}x{} must be between 1 and {MAX_BLANK_SIDE} pixels per side",
            size.width,
            size.height
        );
    }
    Ok(CapturedImage::blank(width as u32, height as u32))
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config_path = match cli.config {
        Some(path) => path,
        None => MeasureConfig::resolve_path()?,
    };

    match cli.command {
        Commands::Measure { script, image, overlay, strict, json } => {
            let config = load_config(&config_path)?;
            run_measure(&config, &script, image.as_deref(), overlay.as_deref(), strict, json)
        }
        Commands::Area { ppu, json, points } => {
            let config = load_config(&config_path)?;
            run_area(&config, ppu, &points, json)
        }
        Commands::Calibrate { protocol } => {
            let config = load_config(&config_path)?;
            run_calibrate(&config, protocol)
        }
        Commands::Config { init } => run_config(&config_path, init),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<MeasureConfig> {
    MeasureConfig::load_or_default(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn print_measurement(measurement: &AreaMeasurement, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(measurement)?);
    } else {
        println!("Area: {}", measurement.formatted_label);
    }
    Ok(())
}

fn run_measure(
    config: &MeasureConfig,
    script_path: &Path,
    image: Option<&Path>,
    overlay: Option<&Path>,
    strict: bool,
    json: bool,
) -> Result<()> {
    let script = Script::load(script_path)?;
    log::debug!(
        "replaying {} script events from {}",
        script.events.len(),
        script_path.display()
    );

    let capture = match (image, script.image_size) {
        (Some(path), _) => CapturedImage::open(path)
            .with_context(|| format!("failed to load image {}", path.display()))?,
        (None, Some(size)) => blank_capture(size)?,
        (None, None) => anyhow::bail!("script has no image_size; pass --image"),
    };

    let native = capture.size();
    let display = script.display.unwrap_or(RenderedRect::sized(native.width, native.height));
    let adapter = InputAdapter::new(native, display).context("invalid display geometry")?;

    let session = MeasurementSession::new(config.calibration_manager());
    let renderer = OverlayRenderer::new(capture, config.overlay.clone());
    let mut controller =
        Controller::new(session, adapter, renderer, NoScrollControl)
            .with_drag_tracing(config.drag_tracing);

    let mut measurement = None;
    for (index, step) in script.events.iter().enumerate() {
        for event in step.to_events(config.two_point_distance) {
            match controller.handle(event) {
                Ok(Outcome::Finished(result)) => measurement = Some(result),
                Ok(_) => {}
                Err(error) if strict => {
                    return Err(error).with_context(|| format!("event {} rejected", index + 1));
                }
                Err(error) => eprintln!("event {} rejected: {error}", index + 1),
            }
        }
    }

    if let Some(path) = overlay {
        controller
            .renderer()
            .save(path)
            .with_context(|| format!("failed to write overlay to {}", path.display()))?;
    }

    let state = controller.session().state();
    let measurement = measurement
        .with_context(|| format!("script ended without a finished measurement (state: {state})"))?;
    print_measurement(&measurement, json)
}

fn run_area(config: &MeasureConfig, ppu: f64, points: &[Point], json: bool) -> Result<()> {
    let mut session = MeasurementSession::new(config.calibration_manager());
    session.calibrate(CalibrationInput::Manual { pixels_per_unit: ppu })?;
    session.begin_measuring()?;
    for &point in points {
        session.add_point(point)?;
    }
    let measurement = session.finish()?;
    print_measurement(&measurement, json)
}

fn run_calibrate(config: &MeasureConfig, protocol: CalibrateCommand) -> Result<()> {
    let input = match protocol {
        CalibrateCommand::Frame { rendered_width, rendered_height } => {
            CalibrationInput::ReferenceFrame { rendered_width, rendered_height }
        }
        CalibrateCommand::TwoPoint { from, to, distance } => CalibrationInput::TwoPoint {
            p1: from,
            p2: to,
            known_distance: distance.unwrap_or(config.two_point_distance),
        },
    };

    let mut manager = config.calibration_manager();
    let ratio = manager.calibrate(input)?;
    println!("{:.4} px/{}", ratio.pixels_per_unit(), manager.unit());
    Ok(())
}

fn run_config(path: &Path, init: bool) -> Result<()> {
    let config = load_config(path)?;
    if init && !path.exists() {
        config
            .save(path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
