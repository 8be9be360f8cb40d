// Posture Monitor Core - sampling, smoothing, calibration, classification
// Camera-agnostic engine behind the posture tray utility

// Module declarations
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod managers;
pub mod monitor;
pub mod settings;
pub mod source;
pub mod trace;

// Re-exports for convenience
pub use calibration::{
    CalibrationPhase, CalibrationProcedure, CalibrationProgress, CalibrationThresholds,
};
pub use classifier::{ClassifierParams, PostureClassifier, PostureState, TickOutcome};
pub use config::MonitorConfig;
pub use error::{CalibrationError, ErrorCode, SourceError};
pub use filter::SmoothingFilter;
pub use monitor::{MonitorEvent, MonitorHandle, Observation};
pub use settings::{Settings, SettingsStore};
pub use source::{FrameSource, Sample, ScriptedSource, SyntheticSource};
