//! Measurement configuration
//!
//! Holds the physical reference constants, tracing behaviour and overlay
//! style. Configuration is stored as versioned JSON and can be located via
//! the platform config directory or the `AREATRACE_CONFIG` environment
//! variable.

use crate::calibration::{CalibrationManager, ReferenceFrame};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "AREATRACE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to resolve config directory")]
    NoConfigDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
}

/// Colors and sizes used when drawing session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Radius of traced point markers in image pixels
    pub point_radius: u32,
    /// RGBA color of point markers
    pub point_color: [u8; 4],
    /// RGBA color of segments
    pub line_color: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self { point_radius: 3, point_color: [255, 0, 0, 255], line_color: [0, 0, 255, 255] }
    }
}

/// Configuration for a measuring workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Unit of length for calibration and results
    pub unit: String,
    /// Physical size of the reference frame
    pub reference_frame: ReferenceFrame,
    /// Real distance between the two calibration clicks
    pub two_point_distance: f64,
    /// Add points while dragging with the pointer held down
    pub drag_tracing: bool,
    pub overlay: OverlayStyle,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            unit: "cm".to_string(),
            reference_frame: ReferenceFrame::default(),
            two_point_distance: 1.0,
            drag_tracing: true,
            overlay: OverlayStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: MeasureConfig,
}

impl MeasureConfig {
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_reference_frame(mut self, real_width: f64, real_height: Option<f64>) -> Self {
        self.reference_frame = ReferenceFrame { real_width, real_height };
        self
    }

    pub fn with_two_point_distance(mut self, distance: f64) -> Self {
        self.two_point_distance = distance;
        self
    }

    pub fn with_drag_tracing(mut self, enabled: bool) -> Self {
        self.drag_tracing = enabled;
        self
    }

    /// Calibration manager seeded with this configuration
    pub fn calibration_manager(&self) -> CalibrationManager {
        CalibrationManager::new(self.reference_frame, self.two_point_distance, self.unit.clone())
    }

    /// Platform config file location
    ///
    /// - Linux: ~/.config/areatrace/config.json
    /// - macOS: ~/Library/Application Support/dev.areatrace.areatrace/config.json
    /// - Windows: %APPDATA%\areatrace\areatrace\config\config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "areatrace", "areatrace")
            .ok_or(ConfigError::NoConfigDirectory)?;
        Ok(dirs.config_dir().join("config.json"))
    }

    /// Config path from `AREATRACE_CONFIG`, falling back to the platform path
    pub fn resolve_path() -> Result<PathBuf, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Ok(PathBuf::from(path)),
            None => Self::default_path(),
        }
    }

    /// Load from `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let bytes = fs::read(path.as_ref())?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version > CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope.config)
    }

    /// Load from `path`, or defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: self.clone() };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
