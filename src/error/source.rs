// Frame source error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Frame source error code constants
///
/// These constants provide a single source of truth for error codes
/// shared with presentation layers that report source failures.
///
/// Error code range: 1001-1005
pub struct SourceErrorCodes {}

impl SourceErrorCodes {
    /// Monitor loop is already running
    pub const ALREADY_RUNNING: i32 = 1001;

    /// Monitor loop is not running
    pub const NOT_RUNNING: i32 = 1002;

    /// Frame source could not be opened or failed fatally
    pub const UNAVAILABLE: i32 = 1003;

    /// A single frame read failed (transient)
    pub const READ_FAILURE: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;
}

/// Log a source error with structured context
///
/// Logs the numeric error code, the component, and the human-readable
/// message. Non-blocking; never panics.
pub fn log_source_error(err: &SourceError, context: &str) {
    error!(
        "Source error in {}: code={}, component=FrameSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Frame-source and sampling-loop errors
///
/// These errors cover monitor lifecycle operations and per-tick frame
/// acquisition.
///
/// Error code range: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Monitor loop is already running
    AlreadyRunning,

    /// Monitor loop is not running
    NotRunning,

    /// Frame source could not be opened, or failed fatally mid-run
    Unavailable { details: String },

    /// A single frame read failed; treated as a missed detection
    ReadFailure { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for SourceError {
    fn code(&self) -> i32 {
        match self {
            SourceError::AlreadyRunning => SourceErrorCodes::ALREADY_RUNNING,
            SourceError::NotRunning => SourceErrorCodes::NOT_RUNNING,
            SourceError::Unavailable { .. } => SourceErrorCodes::UNAVAILABLE,
            SourceError::ReadFailure { .. } => SourceErrorCodes::READ_FAILURE,
            SourceError::LockPoisoned { .. } => SourceErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SourceError::AlreadyRunning => {
                "Monitor already running. Call stop() first.".to_string()
            }
            SourceError::NotRunning => "Monitor not running. Call start() first.".to_string(),
            SourceError::Unavailable { details } => {
                format!("Frame source unavailable: {}", details)
            }
            SourceError::ReadFailure { reason } => {
                format!("Frame read failed: {}", reason)
            }
            SourceError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Unavailable {
            details: err.to_string(),
        }
    }
}
