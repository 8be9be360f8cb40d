// CalibrationProcedure - live sample collection workflow
//
// This module manages the calibration workflow state machine for capturing
// posture samples off the running monitor. The procedure follows a 2-phase
// workflow:
// 1. Collect smoothed head heights while the user holds an upright pose
// 2. After an explicit advance, collect the same while they slouch
//
// Phases do not advance on their own: the user has to reposition between
// them, so the controlling layer calls advance_phase() when they are ready.

use crate::calibration::state::CalibrationThresholds;
use crate::error::CalibrationError;

/// Posture phase being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CalibrationPhase {
    /// Upright reference pose
    Good,
    /// Slouched reference pose
    Bad,
}

impl CalibrationPhase {
    /// Get the next phase in the calibration sequence
    ///
    /// # Returns
    /// * `Some(CalibrationPhase)` - Next phase to capture
    /// * `None` - Capture sequence complete
    pub fn next(&self) -> Option<CalibrationPhase> {
        match self {
            CalibrationPhase::Good => Some(CalibrationPhase::Bad),
            CalibrationPhase::Bad => None,
        }
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            CalibrationPhase::Good => "UPRIGHT",
            CalibrationPhase::Bad => "SLOUCHED",
        }
    }
}

/// Progress information for the current calibration phase
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationProgress {
    /// Phase currently being captured
    pub current_phase: CalibrationPhase,
    /// Samples collected for the current phase
    pub samples_collected: usize,
    /// Samples needed per phase
    pub samples_needed: usize,
}

impl CalibrationProgress {
    /// Check if the current phase has collected enough samples
    pub fn is_phase_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }

    /// Check if the entire capture sequence is complete
    pub fn is_capture_complete(&self) -> bool {
        self.is_phase_complete() && self.current_phase == CalibrationPhase::Bad
    }
}

/// CalibrationProcedure manages the sample collection workflow
pub struct CalibrationProcedure {
    /// Smoothed head heights captured while upright
    good_samples: Vec<f64>,
    /// Smoothed head heights captured while slouched
    bad_samples: Vec<f64>,
    /// Phase currently being captured
    current_phase: CalibrationPhase,
    /// Samples needed per phase
    samples_per_phase: usize,
    /// Separation required of the finalized thresholds
    min_separation: f64,
}

impl CalibrationProcedure {
    /// Create a new calibration procedure
    ///
    /// # Arguments
    /// * `samples_per_phase` - Number of samples to collect per phase
    /// * `min_separation` - Required distance between the finalized thresholds
    pub fn new(samples_per_phase: usize, min_separation: f64) -> Self {
        Self {
            good_samples: Vec::new(),
            bad_samples: Vec::new(),
            current_phase: CalibrationPhase::Good,
            samples_per_phase: samples_per_phase.max(1),
            min_separation,
        }
    }

    /// Create with default configuration
    pub fn new_default() -> Self {
        Self::new(30, CalibrationThresholds::MIN_SEPARATION)
    }

    /// Add a smoothed measurement for the current phase
    ///
    /// Samples beyond the phase target are ignored so the sampling loop can
    /// keep feeding ticks while waiting for the user to advance.
    ///
    /// # Returns
    /// * `Some(CalibrationProgress)` - Sample accepted, progress after it
    /// * `None` - Phase already full, sample ignored
    pub fn add_sample(&mut self, smoothed_y: f64) -> Option<CalibrationProgress> {
        let samples = match self.current_phase {
            CalibrationPhase::Good => &mut self.good_samples,
            CalibrationPhase::Bad => &mut self.bad_samples,
        };
        if samples.len() >= self.samples_per_phase {
            return None;
        }
        samples.push(smoothed_y);
        Some(self.get_progress())
    }

    /// Move capture to the next phase
    ///
    /// # Returns
    /// * `Ok(CalibrationProgress)` - Progress for the new phase; already on
    ///   the final phase is a no-op
    /// * `Err(CalibrationError::PhaseIncomplete)` - Current phase has not
    ///   collected enough samples yet
    pub fn advance_phase(&mut self) -> Result<CalibrationProgress, CalibrationError> {
        let progress = self.get_progress();
        if !progress.is_phase_complete() {
            return Err(CalibrationError::PhaseIncomplete {
                phase: self.current_phase.display_name().to_string(),
                collected: progress.samples_collected,
                required: progress.samples_needed,
            });
        }
        if let Some(next_phase) = self.current_phase.next() {
            self.current_phase = next_phase;
        }
        Ok(self.get_progress())
    }

    /// Get current calibration progress
    pub fn get_progress(&self) -> CalibrationProgress {
        let samples_collected = match self.current_phase {
            CalibrationPhase::Good => self.good_samples.len(),
            CalibrationPhase::Bad => self.bad_samples.len(),
        };

        CalibrationProgress {
            current_phase: self.current_phase,
            samples_collected,
            samples_needed: self.samples_per_phase,
        }
    }

    /// Check if both phases have collected their samples
    pub fn is_complete(&self) -> bool {
        self.good_samples.len() >= self.samples_per_phase
            && self.bad_samples.len() >= self.samples_per_phase
    }

    /// Get the phase currently being captured
    pub fn current_phase(&self) -> CalibrationPhase {
        self.current_phase
    }

    /// Finalize capture and produce validated thresholds
    ///
    /// Averages each phase and validates the pair: the upright average must
    /// sit above the slouched one with enough separation between them.
    ///
    /// # Returns
    /// * `Ok(CalibrationThresholds)` - Validated, calibrated thresholds
    /// * `Err(CalibrationError)` - Capture incomplete or averages invalid
    pub fn finalize(&self) -> Result<CalibrationThresholds, CalibrationError> {
        if !self.is_complete() {
            let collected = self
                .good_samples
                .len()
                .min(self.bad_samples.len());
            return Err(CalibrationError::InsufficientSamples {
                required: self.samples_per_phase,
                collected,
            });
        }

        let good_avg = mean(&self.good_samples);
        let bad_avg = mean(&self.bad_samples);
        CalibrationThresholds::from_samples(good_avg, bad_avg, self.min_separation)
    }
}

fn mean(samples: &[f64]) -> f64 {
    let sum: f64 = samples.iter().sum();
    sum / samples.len() as f64
}
