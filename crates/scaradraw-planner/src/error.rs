//! Error types for the planner crate.
//!
//! This module provides structured error types for contour loading,
//! parameter validation, and trajectory export.

use std::io;
use thiserror::Error;

/// Errors that can occur while planning a trajectory.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Invalid parameters were provided to the planner.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Contour input could not be loaded.
    #[error("Failed to load contours: {0}")]
    LoadError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to planner parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter that must be strictly positive was not.
    #[error("Parameter '{name}' must be positive, got {value}")]
    NotPositive { name: String, value: f64 },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Image dimensions are invalid (zero).
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Result type alias for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;
