//! Frame source abstractions for the monitor core.

use crate::error::SourceError;

/// One sampling attempt from a frame source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Subject detected; normalized head height, 0.0 = top of frame
    Detected(f64),
    /// Frame processed but no subject found
    NoDetection,
}

/// Trait implemented by camera/pose integrations feeding the monitor.
///
/// The monitor drives one instance from its loop thread: `start()` once,
/// `sample()` once per tick run to completion, `stop()` when the loop
/// winds down. Implementations use interior mutability; `stop()` must be
/// safe to call repeatedly.
///
/// Errors split by severity: `ReadFailure` marks a single bad frame and is
/// treated as a missed detection, any other error is fatal for the run.
pub trait FrameSource: Send + Sync {
    fn start(&self, camera_index: u32) -> Result<(), SourceError>;
    fn sample(&self) -> Result<Sample, SourceError>;
    fn stop(&self) -> Result<(), SourceError>;
}

mod scripted;
mod synthetic;

pub use scripted::ScriptedSource;
pub use synthetic::SyntheticSource;
