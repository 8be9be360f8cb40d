// CalibrationManager: Focused manager for the calibration workflow
//
// Single Responsibility: Calibration procedure lifecycle and settings
// write-through

use std::sync::{Arc, Mutex};

use crate::calibration::{CalibrationProcedure, CalibrationProgress, CalibrationThresholds};
use crate::config::CalibrationConfig;
use crate::error::{log_calibration_error, CalibrationError};
use crate::settings::SettingsStore;

/// Manages the calibration workflow and threshold persistence
///
/// This manager handles:
/// - Starting/advancing/finishing/cancelling the calibration procedure
/// - Feeding smoothed measurements from the sampling loop into the
///   active procedure
/// - Writing validated thresholds through to the settings store
/// - Thread-safe lock management
///
/// The sampling loop and the presentation layer share one manager: the
/// loop feeds samples each tick while the presentation layer drives the
/// phase transitions.
pub struct CalibrationManager {
    procedure: Arc<Mutex<Option<CalibrationProcedure>>>,
    store: Arc<SettingsStore>,
    config: CalibrationConfig,
}

impl CalibrationManager {
    /// Create a new CalibrationManager
    ///
    /// Initializes with no calibration in progress.
    pub fn new(store: Arc<SettingsStore>, config: CalibrationConfig) -> Self {
        Self {
            procedure: Arc::new(Mutex::new(None)),
            store,
            config,
        }
    }

    /// Start the calibration workflow
    ///
    /// Creates a fresh two-phase procedure. While it is active the sampling
    /// loop routes smoothed measurements here instead of classifying them.
    ///
    /// # Errors
    /// - `AlreadyInProgress` - A procedure is already active
    /// - `StatePoisoned` - Lock poisoning on the procedure slot
    pub fn start(&self) -> Result<(), CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;

        if procedure_guard.is_some() {
            let err = CalibrationError::AlreadyInProgress;
            log_calibration_error(&err, "start_calibration");
            return Err(err);
        }

        *procedure_guard = Some(CalibrationProcedure::new(
            self.config.samples_per_phase,
            self.config.min_threshold_separation,
        ));
        log::info!(
            "[CalibrationManager] Calibration started: {} samples per phase",
            self.config.samples_per_phase
        );

        Ok(())
    }

    /// Whether a calibration procedure is currently active
    ///
    /// Used by the sampling loop to decide between feeding the procedure
    /// and classifying. A poisoned lock reads as inactive.
    pub fn is_active(&self) -> bool {
        match self.procedure.lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => {
                log::error!("[CalibrationManager] Procedure lock poisoned in is_active");
                false
            }
        }
    }

    /// Feed one smoothed measurement into the active procedure
    ///
    /// # Returns
    /// * `Ok(Some(CalibrationProgress))` - Sample accepted
    /// * `Ok(None)` - No procedure active, or current phase already full
    pub fn feed_sample(
        &self,
        smoothed_y: f64,
    ) -> Result<Option<CalibrationProgress>, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;
        Ok(procedure_guard
            .as_mut()
            .and_then(|procedure| procedure.add_sample(smoothed_y)))
    }

    /// Move the active procedure to its next phase
    ///
    /// # Errors
    /// - `NotInProgress` - No procedure active
    /// - `PhaseIncomplete` - Current phase has not collected enough samples
    pub fn advance_phase(&self) -> Result<CalibrationProgress, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;

        match procedure_guard.as_mut() {
            Some(procedure) => procedure.advance_phase().inspect_err(|err| {
                log_calibration_error(err, "advance_calibration_phase");
            }),
            None => {
                let err = CalibrationError::NotInProgress;
                log_calibration_error(&err, "advance_calibration_phase");
                Err(err)
            }
        }
    }

    /// Progress of the active procedure, if any
    pub fn get_progress(&self) -> Result<Option<CalibrationProgress>, CalibrationError> {
        let procedure_guard = self.lock_procedure()?;
        Ok(procedure_guard
            .as_ref()
            .map(|procedure| procedure.get_progress()))
    }

    /// Finish calibration and persist the validated thresholds
    ///
    /// Finalizes the procedure, writes the thresholds into the settings
    /// store, and syncs the store to disk. On a validation error the
    /// procedure is kept so the caller can inspect progress or cancel;
    /// persistence failures are logged without failing the calibration,
    /// since the in-memory store already holds the new thresholds.
    ///
    /// # Errors
    /// - `NotInProgress` - No procedure active
    /// - `InsufficientSamples` / `InvalidOrdering` / `InsufficientRange` -
    ///   Validation failed
    pub fn finish(&self) -> Result<CalibrationThresholds, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;

        let procedure = match procedure_guard.as_ref() {
            Some(procedure) => procedure,
            None => {
                let err = CalibrationError::NotInProgress;
                log_calibration_error(&err, "finish_calibration");
                return Err(err);
            }
        };

        let thresholds = procedure.finalize().inspect_err(|err| {
            log_calibration_error(err, "finish_calibration");
        })?;
        *procedure_guard = None;

        self.persist_thresholds(&thresholds)?;

        log::info!(
            "[CalibrationManager] Calibration complete: good_y={:.3}, bad_y={:.3}",
            thresholds.good_y,
            thresholds.bad_y
        );
        Ok(thresholds)
    }

    /// Apply a pair of already-averaged posture samples as thresholds
    ///
    /// One-step alternative to the phased capture for callers that hold
    /// averaged measurements from elsewhere: validates the pair the same
    /// way a finished procedure would and writes the result through to
    /// the settings store.
    ///
    /// # Errors
    /// - `AlreadyInProgress` - A live capture owns the thresholds right now
    /// - `InvalidOrdering` / `InsufficientRange` - Validation failed
    pub fn apply_samples(
        &self,
        good_sample: f64,
        bad_sample: f64,
    ) -> Result<CalibrationThresholds, CalibrationError> {
        let procedure_guard = self.lock_procedure()?;
        if procedure_guard.is_some() {
            let err = CalibrationError::AlreadyInProgress;
            log_calibration_error(&err, "apply_samples");
            return Err(err);
        }

        let thresholds = CalibrationThresholds::from_samples(
            good_sample,
            bad_sample,
            self.config.min_threshold_separation,
        )
        .inspect_err(|err| log_calibration_error(err, "apply_samples"))?;

        self.persist_thresholds(&thresholds)?;

        log::info!(
            "[CalibrationManager] Thresholds applied directly: good_y={:.3}, bad_y={:.3}",
            thresholds.good_y,
            thresholds.bad_y
        );
        Ok(thresholds)
    }

    /// Cancel the active procedure
    ///
    /// # Returns
    /// * `Ok(true)` - An active procedure was discarded
    /// * `Ok(false)` - Nothing was active
    pub fn cancel(&self) -> Result<bool, CalibrationError> {
        let mut procedure_guard = self.lock_procedure()?;
        let was_active = procedure_guard.take().is_some();
        if was_active {
            log::info!("[CalibrationManager] Calibration cancelled");
        }
        Ok(was_active)
    }

    /// Write validated thresholds into the settings store and sync
    ///
    /// A failed disk write is logged without failing the calibration; the
    /// in-memory store already holds the new thresholds.
    fn persist_thresholds(
        &self,
        thresholds: &CalibrationThresholds,
    ) -> Result<(), CalibrationError> {
        self.store
            .update(|settings| thresholds.apply_to_settings(settings))
            .map_err(|_| CalibrationError::StatePoisoned)?;
        if let Err(err) = self.store.sync() {
            log::warn!(
                "[CalibrationManager] Failed to persist calibrated settings: {}",
                err
            );
        }
        Ok(())
    }

    /// Safely acquire lock on the calibration procedure slot
    fn lock_procedure(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<CalibrationProcedure>>, CalibrationError> {
        self.procedure
            .lock()
            .map_err(|_| CalibrationError::StatePoisoned)
    }
}
