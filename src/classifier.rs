// Posture classifier - threshold/dead-zone posture state machine
//
// This module classifies smoothed head-height measurements into posture
// states using calibrated thresholds. The calibrated good/bad positions
// define a tolerance band scaled by user sensitivity; a dead zone around
// the band edges keeps small oscillations from flapping the state, and a
// run of missed detections collapses the state to Away.

use crate::calibration::CalibrationThresholds;
use crate::settings::Settings;

/// PostureState represents the classified posture at a point in time
///
/// Unknown is the initial state and the only state reported before
/// calibration. Away means the subject has not been detected for a
/// sustained run of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PostureState {
    /// No classification available yet
    Unknown,
    /// Head at or above the calibrated upright position
    Good,
    /// Head at or below the calibrated slouched position
    Bad,
    /// Subject not detected for a sustained run of ticks
    Away,
}

/// Per-tick classifier tuning, snapshotted from settings
///
/// Values are sanitized at construction so a hand-edited settings file
/// cannot produce a degenerate band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    /// Strictness in (0, 1]; 1.0 places the band edges exactly on the
    /// calibrated thresholds, lower values push them outward
    pub sensitivity: f64,
    /// Extra margin a reading must clear before a Good/Bad flip
    pub dead_zone: f64,
}

impl ClassifierParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sensitivity: settings.sensitivity.clamp(0.01, 1.0),
            dead_zone: settings.dead_zone.max(0.0),
        }
    }
}

/// Result of feeding one tick into the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// State after this tick
    pub state: PostureState,
    /// Whether this tick changed the state
    pub changed: bool,
    /// Set while thresholds are not calibrated; the monitor reports the
    /// rising edge to subscribers
    pub calibration_required: bool,
}

/// Classification band edges derived from thresholds and sensitivity
#[derive(Debug, Clone, Copy)]
struct Band {
    good_edge: f64,
    bad_edge: f64,
}

impl Band {
    fn compute(thresholds: &CalibrationThresholds, sensitivity: f64) -> Self {
        let mid = (thresholds.good_y + thresholds.bad_y) / 2.0;
        let half = (thresholds.bad_y - thresholds.good_y) / 2.0;
        let effective_half = half / sensitivity;
        Self {
            good_edge: mid - effective_half,
            bad_edge: mid + effective_half,
        }
    }
}

/// PostureClassifier applies threshold rules to smoothed measurements
///
/// The classifier is a plain state machine: one `observe` or `miss` call
/// per tick, thresholds and params snapshotted by the caller. It never
/// fails; every tick yields a `TickOutcome`.
#[derive(Debug)]
pub struct PostureClassifier {
    state: PostureState,
    /// Last Good/Bad seen, remembered across Away so a neutral reading on
    /// return restores the previous classification
    last_active: Option<PostureState>,
    miss_streak: u32,
    away_after_misses: u32,
}

impl PostureClassifier {
    /// Create a classifier in the Unknown state
    ///
    /// # Arguments
    /// * `away_after_misses` - Consecutive missed detections before Away
    pub fn new(away_after_misses: u32) -> Self {
        Self {
            state: PostureState::Unknown,
            last_active: None,
            miss_streak: 0,
            away_after_misses: away_after_misses.max(1),
        }
    }

    /// Current state
    pub fn state(&self) -> PostureState {
        self.state
    }

    /// Feed one smoothed measurement
    ///
    /// Classification rules:
    /// 1. Uncalibrated thresholds always yield Unknown with the
    ///    calibration-required flag set.
    /// 2. From Good, flipping to Bad requires y > bad_edge + dead_zone;
    ///    from Bad, flipping to Good requires y < good_edge - dead_zone.
    /// 3. From Unknown or Away the plain band edges apply: y <= good_edge
    ///    is Good, y >= bad_edge is Bad, and a neutral reading restores
    ///    the remembered Good/Bad (or stays Unknown).
    pub fn observe(
        &mut self,
        smoothed_y: f64,
        thresholds: &CalibrationThresholds,
        params: &ClassifierParams,
    ) -> TickOutcome {
        self.miss_streak = 0;

        if !thresholds.is_calibrated {
            return TickOutcome {
                calibration_required: true,
                ..self.transition(PostureState::Unknown)
            };
        }

        let band = Band::compute(thresholds, params.sensitivity);
        let next = match self.state {
            PostureState::Good => {
                if smoothed_y > band.bad_edge + params.dead_zone {
                    PostureState::Bad
                } else {
                    PostureState::Good
                }
            }
            PostureState::Bad => {
                if smoothed_y < band.good_edge - params.dead_zone {
                    PostureState::Good
                } else {
                    PostureState::Bad
                }
            }
            PostureState::Unknown | PostureState::Away => {
                if smoothed_y <= band.good_edge {
                    PostureState::Good
                } else if smoothed_y >= band.bad_edge {
                    PostureState::Bad
                } else {
                    self.last_active.unwrap_or(PostureState::Unknown)
                }
            }
        };

        self.transition(next)
    }

    /// Record a tick with no usable detection
    ///
    /// Reaching the configured streak forces Away regardless of the prior
    /// state; any detected tick resets the streak.
    pub fn miss(&mut self) -> TickOutcome {
        self.miss_streak = self.miss_streak.saturating_add(1);
        if self.miss_streak >= self.away_after_misses {
            self.transition(PostureState::Away)
        } else {
            self.transition(self.state)
        }
    }

    fn transition(&mut self, next: PostureState) -> TickOutcome {
        let changed = next != self.state;
        self.state = next;
        if matches!(next, PostureState::Good | PostureState::Bad) {
            self.last_active = Some(next);
        }
        TickOutcome {
            state: next,
            changed,
            calibration_required: false,
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
