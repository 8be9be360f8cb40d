// Calibration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// These constants provide a single source of truth for error codes
/// shared with presentation layers that report calibration failures.
///
/// Error code range: 2001-2007
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Good threshold is not strictly above the bad threshold
    pub const INVALID_ORDERING: i32 = 2001;

    /// Thresholds are too close together
    pub const INSUFFICIENT_RANGE: i32 = 2002;

    /// Insufficient samples collected for calibration
    pub const INSUFFICIENT_SAMPLES: i32 = 2003;

    /// No calibration procedure in progress
    pub const NOT_IN_PROGRESS: i32 = 2004;

    /// Calibration already in progress
    pub const ALREADY_IN_PROGRESS: i32 = 2005;

    /// Current phase has not collected enough samples to advance
    pub const PHASE_INCOMPLETE: i32 = 2006;

    /// Calibration state lock was poisoned
    pub const STATE_POISONED: i32 = 2007;
}

/// Log a calibration error with structured context
///
/// This function logs calibration errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationProcedure, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover threshold validation, live calibration procedure
/// operations, and calibration state management.
///
/// Error code range: 2001-2007
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Good threshold is not strictly above the bad threshold on screen
    /// (lower numeric y means higher on screen)
    InvalidOrdering { good: f64, bad: f64 },

    /// Thresholds are closer together than the minimum separation
    InsufficientRange { separation: f64, required: f64 },

    /// Insufficient samples collected for calibration
    InsufficientSamples { required: usize, collected: usize },

    /// No calibration procedure in progress
    NotInProgress,

    /// Calibration already in progress
    AlreadyInProgress,

    /// Current phase has not collected enough samples to advance
    PhaseIncomplete {
        phase: String,
        collected: usize,
        required: usize,
    },

    /// Calibration state lock was poisoned
    StatePoisoned,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InvalidOrdering { .. } => CalibrationErrorCodes::INVALID_ORDERING,
            CalibrationError::InsufficientRange { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_RANGE
            }
            CalibrationError::InsufficientSamples { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_SAMPLES
            }
            CalibrationError::NotInProgress => CalibrationErrorCodes::NOT_IN_PROGRESS,
            CalibrationError::AlreadyInProgress => CalibrationErrorCodes::ALREADY_IN_PROGRESS,
            CalibrationError::PhaseIncomplete { .. } => CalibrationErrorCodes::PHASE_INCOMPLETE,
            CalibrationError::StatePoisoned => CalibrationErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InvalidOrdering { good, bad } => {
                format!(
                    "Invalid threshold ordering: good_y ({}) must be less than bad_y ({})",
                    good, bad
                )
            }
            CalibrationError::InsufficientRange {
                separation,
                required,
            } => {
                format!(
                    "Threshold separation {} below minimum {}",
                    separation, required
                )
            }
            CalibrationError::InsufficientSamples {
                required,
                collected,
            } => {
                format!("Insufficient samples: need {}, got {}", required, collected)
            }
            CalibrationError::NotInProgress => "No calibration in progress".to_string(),
            CalibrationError::AlreadyInProgress => "Calibration already in progress".to_string(),
            CalibrationError::PhaseIncomplete {
                phase,
                collected,
                required,
            } => {
                format!(
                    "Phase {} incomplete: need {}, got {}",
                    phase, required, collected
                )
            }
            CalibrationError::StatePoisoned => "Calibration state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
