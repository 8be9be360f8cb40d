//! Monitor module housing the reusable sampling core.
//!
//! This module exposes the event vocabulary (`events`) and the
//! `MonitorHandle` orchestration layer (`core`) that drives a frame source
//! through the smoothing, calibration, and classification pipeline.

pub mod core;
pub mod events;

pub use core::MonitorHandle;
pub use events::{MonitorEvent, Observation};
