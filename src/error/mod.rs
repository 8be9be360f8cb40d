// Error types for the posture monitor core
//
// This module defines custom error types for frame-source and calibration
// operations, providing structured error handling with numeric codes suitable
// for presentation-layer reporting.

mod calibration;
mod source;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use source::{log_source_error, SourceError, SourceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the presentation boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
