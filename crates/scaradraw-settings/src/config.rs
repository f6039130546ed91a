//! Configuration and settings management for scaradraw
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Arm geometry (link lengths, elbow branch)
//! - Planning (workspace size, contour filtering, point budget)
//! - Motion (pacing, protocol, step resolution)
//! - Connection (port, baud rate, timeouts)
//!
//! Every section is `#[serde(default)]`, so a file only has to name the
//! values it changes.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use scaradraw_communication::{
    MotionProtocol, ProtocolKind, SerialParams, AUTO_PORT, DEFAULT_STEPS_PER_DEGREE,
};
use scaradraw_core::{ArmGeometry, ElbowBranch, Point2D};
use scaradraw_motion::SequencerConfig;
use scaradraw_planner::{
    PlannerSettings, DEFAULT_MAX_POINTS, DEFAULT_MIN_PERIMETER, DEFAULT_TRAVEL_THRESHOLD,
    DEFAULT_WORKSPACE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// File name used inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Arm geometry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmSettings {
    /// Shoulder-to-elbow link length in mm
    pub link1_length: f64,
    /// Elbow-to-tip link length in mm
    pub link2_length: f64,
    /// Inverse kinematics branch
    pub elbow_branch: ElbowBranch,
}

impl Default for ArmSettings {
    fn default() -> Self {
        let geometry = ArmGeometry::default();
        Self {
            link1_length: geometry.link1_length(),
            link2_length: geometry.link2_length(),
            elbow_branch: ElbowBranch::default(),
        }
    }
}

/// Trajectory planning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningSettings {
    /// Side of the square drawing area in mm
    pub workspace_size: f64,
    /// Contours with a shorter closed perimeter (px) are discarded
    pub min_perimeter: f64,
    /// Upper bound on moves after optimization
    pub max_points: usize,
    /// Jump (px) treated as pen-up travel for raw point lists
    pub travel_threshold: f64,
    /// Arm-space X translation applied after mapping, in mm
    pub origin_offset_x: f64,
    /// Arm-space Y translation applied after mapping, in mm
    pub origin_offset_y: f64,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        Self {
            workspace_size: DEFAULT_WORKSPACE_SIZE,
            min_perimeter: DEFAULT_MIN_PERIMETER,
            max_points: DEFAULT_MAX_POINTS,
            travel_threshold: DEFAULT_TRAVEL_THRESHOLD,
            origin_offset_x: 0.0,
            origin_offset_y: 0.0,
        }
    }
}

/// Motion playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Delay between waypoints in milliseconds
    pub pacing_ms: u64,
    /// Command vocabulary spoken by the controller
    pub protocol: ProtocolKind,
    /// Joint resolution for the step-delta protocol
    pub steps_per_degree: f64,
    /// Wait after opening the port while the controller resets, in milliseconds
    pub settle_ms: u64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            pacing_ms: 50,
            protocol: ProtocolKind::default(),
            steps_per_degree: DEFAULT_STEPS_PER_DEGREE,
            settle_ms: 2000,
        }
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port name, or "Auto" for the first controller-like port
    pub port: String,
    /// Baud rate for serial connections
    pub baud_rate: u32,
    /// Write timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: 115200,
            timeout_ms: 1000,
        }
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Arm geometry
    pub arm: ArmSettings,
    /// Trajectory planning
    pub planner: PlanningSettings,
    /// Motion playback
    pub motion: MotionSettings,
    /// Serial connection
    pub connection: ConnectionSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config file location, e.g. `~/.config/scaradraw/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("scaradraw").join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()).into()
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    ///
    /// Missing parent directories are created.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        positive("arm.link1_length", self.arm.link1_length)?;
        positive("arm.link2_length", self.arm.link2_length)?;

        positive("planner.workspace_size", self.planner.workspace_size)?;
        if self.planner.max_points == 0 {
            return Err(SettingsError::invalid(
                "planner.max_points",
                "must be at least 1",
            ));
        }
        if !self.planner.min_perimeter.is_finite() || self.planner.min_perimeter < 0.0 {
            return Err(SettingsError::invalid(
                "planner.min_perimeter",
                "must not be negative",
            ));
        }
        if !self.planner.travel_threshold.is_finite() || self.planner.travel_threshold < 0.0 {
            return Err(SettingsError::invalid(
                "planner.travel_threshold",
                "must not be negative",
            ));
        }
        if !self.planner.origin_offset_x.is_finite() || !self.planner.origin_offset_y.is_finite() {
            return Err(SettingsError::invalid(
                "planner.origin_offset",
                "must be finite",
            ));
        }

        positive("motion.steps_per_degree", self.motion.steps_per_degree)?;

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid(
                "connection.baud_rate",
                "must be positive",
            ));
        }
        if self.connection.timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.timeout_ms",
                "must be positive",
            ));
        }
        if self.connection.port.trim().is_empty() {
            return Err(SettingsError::invalid("connection.port", "must not be empty"));
        }

        Ok(())
    }

    /// Arm geometry described by the `arm` section
    pub fn arm_geometry(&self) -> SettingsResult<ArmGeometry> {
        ArmGeometry::new(self.arm.link1_length, self.arm.link2_length)
            .map_err(|e| SettingsError::invalid("arm", e.to_string()))
    }

    /// Planner parameters described by the `planner` section
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            workspace_size: self.planner.workspace_size,
            min_perimeter: self.planner.min_perimeter,
            max_points: self.planner.max_points,
            travel_threshold: self.planner.travel_threshold,
            origin_offset: Point2D::new(self.planner.origin_offset_x, self.planner.origin_offset_y),
        }
    }

    /// Sequencer tuning from the `motion` and `arm` sections
    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            pacing: Duration::from_millis(self.motion.pacing_ms),
            elbow_branch: self.arm.elbow_branch,
        }
    }

    /// The configured command vocabulary
    pub fn protocol(&self) -> Arc<dyn MotionProtocol> {
        self.motion.protocol.build(self.motion.steps_per_degree)
    }

    /// Serial parameters, optionally overriding the configured port
    pub fn serial_params(&self, port: Option<&str>) -> SerialParams {
        SerialParams {
            port: port.unwrap_or(&self.connection.port).to_string(),
            baud_rate: self.connection.baud_rate,
            timeout_ms: self.connection.timeout_ms,
            settle_ms: self.motion.settle_ms,
        }
    }
}

fn positive(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(
            key,
            format!("must be positive, got {}", value),
        ))
    }
}
