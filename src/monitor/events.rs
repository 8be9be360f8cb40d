//! Core event types published by the monitor to presentation surfaces.

use serde::{Deserialize, Serialize};

use crate::classifier::PostureState;

/// State-change and fault events, emitted in tick order.
///
/// At most one event of each kind is published per tick. `PostureChanged`
/// and `CalibrationRequired` fire on transitions only, never repeatedly
/// for a held condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Posture state changed this tick
    PostureChanged { state: PostureState },
    /// Classification needs calibrated thresholds
    CalibrationRequired,
    /// Fatal frame-source failure; the loop has halted
    SourceError { message: String },
}

/// Periodic diagnostic snapshot of the smoothed signal.
///
/// Published every few ticks as a heartbeat for debug surfaces, much
/// lower frequency than the tick rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    /// Ticks elapsed since the loop started
    pub tick: u64,
    /// Smoothed head height at this tick
    pub smoothed_y: f64,
    /// Posture state after this tick
    pub state: PostureState,
}
