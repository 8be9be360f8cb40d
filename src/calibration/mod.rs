// Calibration module - posture calibration workflow and threshold storage
//
// This module provides two main components:
// 1. CalibrationThresholds: Validated good/bad head-height thresholds
// 2. CalibrationProcedure: Manages the live sample collection workflow
//
// The calibration workflow:
// 1. Create CalibrationProcedure
// 2. Collect smoothed samples while the user holds an upright pose
// 3. advance_phase(), then collect samples while they hold a slouched pose
// 4. Finalize to validate and produce CalibrationThresholds

pub mod procedure;
pub mod state;

pub use procedure::{CalibrationPhase, CalibrationProcedure, CalibrationProgress};
pub use state::CalibrationThresholds;
