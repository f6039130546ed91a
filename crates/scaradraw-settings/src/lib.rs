//! scaradraw settings crate
//!
//! Loads, validates and saves the arm, planner, motion and connection
//! configuration, and converts it into the types the other crates consume.

pub mod config;
pub mod error;

pub use config::{
    ArmSettings, Config, ConnectionSettings, MotionSettings, PlanningSettings, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
