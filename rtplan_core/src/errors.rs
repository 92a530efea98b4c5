//! # Error Types
//!
//! Structured error types for rtplan_core. Every failure that can affect the
//! dose content of the exported plan is surfaced here rather than defaulted,
//! so the caller (CLI, UI) can present it to the operator.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::errors::{RtPlanError, RtPlanResult};
//!
//! fn validate_ssd(ssd_cm: f64) -> RtPlanResult<()> {
//!     if ssd_cm <= 0.0 {
//!         return Err(RtPlanError::InvalidInput {
//!             field: "ssd_cm".to_string(),
//!             value: ssd_cm.to_string(),
//!             reason: "SSD must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rtplan_core operations
pub type RtPlanResult<T> = Result<T, RtPlanError>;

/// Structured error type for plan translation.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum RtPlanError {
    /// The plan has no primary image, so no frame of reference can be written
    #[error("No primary image found for plan")]
    MissingPrimaryImage,

    /// The trial's beam list is empty
    #[error("No beams found in trial")]
    NoBeamsFound,

    /// Every beam of the trial was skipped during encoding
    #[error("None of the {skipped} beam(s) in the trial could be encoded")]
    NoBeamsEncoded { skipped: usize },

    /// Machine name/version not present in the calibration tables
    #[error("Machine not found in calibration data: {machine} (version '{version}')")]
    UnresolvedMachine { machine: String, version: String },

    /// Machine was found but has no output factor for the requested energy
    #[error("No dose-per-MU calibration for energy '{energy}' on machine {machine}")]
    UnresolvedCalibration { machine: String, energy: String },

    /// Beam references a prescription that is not in the trial
    #[error("Beam '{beam}' references unknown prescription '{prescription}'")]
    UnresolvedPrescription { beam: String, prescription: String },

    /// Machine calibration carries no MLC leaf pairs
    #[error("Machine {machine} has an empty MLC leaf table")]
    EmptyLeafTable { machine: String },

    /// Raw leaf-position count does not match the machine's leaf table
    #[error("Beam '{beam}': expected {expected} leaf positions, found {found}")]
    LeafCountMismatch {
        beam: String,
        expected: usize,
        found: usize,
    },

    /// Beam has no control points
    #[error("Beam '{beam}' has no control points")]
    NoControlPoints { beam: String },

    /// Control-point weights do not sum to one and cannot be used as-is
    #[error("Beam '{beam}': control point weights sum to {total}, expected 1")]
    MetersetWeightMismatch { beam: String, total: f64 },

    /// An input value is invalid (unparseable, out of range, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// DICOM data set could not be built or encoded
    #[error("DICOM encoding error: {reason}")]
    DicomError { reason: String },
}

impl RtPlanError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        RtPlanError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnresolvedMachine error
    pub fn unresolved_machine(machine: impl Into<String>, version: impl Into<String>) -> Self {
        RtPlanError::UnresolvedMachine {
            machine: machine.into(),
            version: version.into(),
        }
    }

    /// Create an UnresolvedCalibration error
    pub fn unresolved_calibration(machine: impl Into<String>, energy: impl Into<String>) -> Self {
        RtPlanError::UnresolvedCalibration {
            machine: machine.into(),
            energy: energy.into(),
        }
    }

    /// Create a NoControlPoints error
    pub fn no_control_points(beam: impl Into<String>) -> Self {
        RtPlanError::NoControlPoints { beam: beam.into() }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        RtPlanError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a DicomError
    pub fn dicom(reason: impl Into<String>) -> Self {
        RtPlanError::DicomError {
            reason: reason.into(),
        }
    }

    /// Whether this error only affects a single beam (the rest of the trial
    /// can still be exported)
    pub fn is_beam_local(&self) -> bool {
        matches!(self, RtPlanError::NoControlPoints { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            RtPlanError::MissingPrimaryImage => "MISSING_PRIMARY_IMAGE",
            RtPlanError::NoBeamsFound => "NO_BEAMS_FOUND",
            RtPlanError::NoBeamsEncoded { .. } => "NO_BEAMS_ENCODED",
            RtPlanError::UnresolvedMachine { .. } => "UNRESOLVED_MACHINE",
            RtPlanError::UnresolvedCalibration { .. } => "UNRESOLVED_CALIBRATION",
            RtPlanError::UnresolvedPrescription { .. } => "UNRESOLVED_PRESCRIPTION",
            RtPlanError::EmptyLeafTable { .. } => "EMPTY_LEAF_TABLE",
            RtPlanError::LeafCountMismatch { .. } => "LEAF_COUNT_MISMATCH",
            RtPlanError::NoControlPoints { .. } => "NO_CONTROL_POINTS",
            RtPlanError::MetersetWeightMismatch { .. } => "METERSET_WEIGHT_MISMATCH",
            RtPlanError::InvalidInput { .. } => "INVALID_INPUT",
            RtPlanError::FileError { .. } => "FILE_ERROR",
            RtPlanError::SerializationError { .. } => "SERIALIZATION_ERROR",
            RtPlanError::DicomError { .. } => "DICOM_ERROR",
        }
    }
}
