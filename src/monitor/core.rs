//! MonitorHandle: reusable posture-monitoring orchestration layer.
//!
//! This struct owns the sampling loop, the calibration workflow, and the
//! broadcast channels shared across CLI and integrator entry points. One
//! handle drives one frame source; the loop runs on a dedicated thread so
//! the handle can be called from both sync and async contexts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;

use crate::calibration::{CalibrationProgress, CalibrationThresholds};
use crate::classifier::{ClassifierParams, PostureClassifier, TickOutcome};
use crate::config::MonitorConfig;
use crate::error::{log_calibration_error, log_source_error, CalibrationError, SourceError};
use crate::filter::SmoothingFilter;
use crate::managers::{BroadcastChannelManager, CalibrationManager};
use crate::monitor::events::{MonitorEvent, Observation};
use crate::settings::{SettingsStore, DEFAULT_SETTINGS_PATH};
use crate::source::{FrameSource, Sample};

#[path = "core_subscriptions.rs"]
mod core_subscriptions;

/// Channel ends and shared state handed to the sampling thread.
struct LoopContext {
    source: Arc<dyn FrameSource>,
    settings: Arc<SettingsStore>,
    calibration: Arc<CalibrationManager>,
    running: Arc<AtomicBool>,
    events_tx: broadcast::Sender<MonitorEvent>,
    observations_tx: broadcast::Sender<Observation>,
    calibration_tx: broadcast::Sender<CalibrationProgress>,
    config: MonitorConfig,
}

/// Shutdown signal and join handle for the sampling thread.
struct LoopWorker {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// MonitorHandle orchestrates the sampling pipeline and shared channels.
pub struct MonitorHandle {
    source: Arc<dyn FrameSource>,
    settings: Arc<SettingsStore>,
    config: MonitorConfig,
    calibration: Arc<CalibrationManager>,
    pub(crate) broadcasts: BroadcastChannelManager,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<LoopWorker>>,
}

impl MonitorHandle {
    /// Create a handle loading configuration and settings from their
    /// conventional file locations.
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        let config = MonitorConfig::load();
        let settings = Arc::new(SettingsStore::open(DEFAULT_SETTINGS_PATH));
        Self::with_settings(source, settings, config)
    }

    /// Create a handle with an injected settings store and configuration.
    ///
    /// Integrators use this to control file locations; tests use it for
    /// temporary stores and fast tick intervals.
    pub fn with_settings(
        source: Arc<dyn FrameSource>,
        settings: Arc<SettingsStore>,
        config: MonitorConfig,
    ) -> Self {
        let calibration = Arc::new(CalibrationManager::new(
            Arc::clone(&settings),
            config.calibration.clone(),
        ));

        let broadcasts = BroadcastChannelManager::new();
        // Channels live for the lifetime of the handle, so subscribers can
        // attach before the first start and stay attached across restarts.
        let _ = broadcasts.init_events();
        let _ = broadcasts.init_observations();
        let _ = broadcasts.init_calibration();

        Self {
            source,
            settings,
            config,
            calibration,
            broadcasts,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    // ========================================================================
    // SAMPLING LOOP LIFECYCLE
    // ========================================================================

    /// Start the frame source and the sampling loop.
    ///
    /// The loop runs on a dedicated thread with its own current-thread
    /// Tokio runtime. Nothing spawns unless the source opens successfully.
    ///
    /// # Errors
    /// - `AlreadyRunning` - The loop is already active
    /// - `Unavailable` - The frame source failed to open
    pub fn start(&self) -> Result<(), SourceError> {
        let mut worker_guard = self.lock_worker()?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let err = SourceError::AlreadyRunning;
            log_source_error(&err, "start_monitor");
            return Err(err);
        }

        // A loop that halted on a fatal source error leaves its finished
        // worker behind; reap it so the slot is free.
        if let Some(stale) = worker_guard.take() {
            let _ = stale.join.join();
        }

        let camera_index = self.settings.snapshot().camera_index;
        if let Err(err) = self.source.start(camera_index) {
            self.running.store(false, Ordering::SeqCst);
            log_source_error(&err, "start_monitor");
            return Err(err);
        }

        let ctx = LoopContext {
            source: Arc::clone(&self.source),
            settings: Arc::clone(&self.settings),
            calibration: Arc::clone(&self.calibration),
            running: Arc::clone(&self.running),
            events_tx: self
                .broadcasts
                .get_events_sender()
                .unwrap_or_else(|| self.broadcasts.init_events()),
            observations_tx: self
                .broadcasts
                .get_observations_sender()
                .unwrap_or_else(|| self.broadcasts.init_observations()),
            calibration_tx: self
                .broadcasts
                .get_calibration_sender()
                .unwrap_or_else(|| self.broadcasts.init_calibration()),
            config: self.config.clone(),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = std::thread::spawn(move || run_loop(ctx, shutdown_rx));
        *worker_guard = Some(LoopWorker { shutdown_tx, join });

        log::info!(
            "[MonitorHandle] Sampling loop started (camera {}, tick {} ms)",
            camera_index,
            self.config.sampling.tick_interval_ms
        );
        Ok(())
    }

    /// Stop the sampling loop.
    ///
    /// Idempotent: returns Ok when the loop is not running. The sampling
    /// thread releases the frame source exactly once, on shutdown or after
    /// a fatal source error, whichever comes first. No further ticks fire
    /// after this returns.
    pub fn stop(&self) -> Result<(), SourceError> {
        let worker = self.lock_worker()?.take();

        match worker {
            Some(worker) => {
                let _ = worker.shutdown_tx.send(true);
                if worker.join.join().is_err() {
                    log::error!("[MonitorHandle] Sampling thread panicked before shutdown");
                    self.running.store(false, Ordering::SeqCst);
                }
                log::info!("[MonitorHandle] Sampling loop stopped");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Safely acquire the worker slot lock.
    fn lock_worker(&self) -> Result<MutexGuard<'_, Option<LoopWorker>>, SourceError> {
        self.worker.lock().map_err(|_| {
            let err = SourceError::LockPoisoned {
                component: "MonitorHandle".to_string(),
            };
            log_source_error(&err, "lock_worker");
            err
        })
    }

    // ========================================================================
    // CALIBRATION METHODS
    // ========================================================================

    /// Begin the two-phase calibration capture.
    ///
    /// The sampling loop must be running for samples to flow; while a
    /// procedure is active the loop feeds it smoothed measurements and
    /// suppresses posture classification.
    pub fn start_calibration(&self) -> Result<(), CalibrationError> {
        self.calibration.start()?;

        // Emit initial progress so subscribers can render the capture UI
        // before the first sample lands.
        if let Some(tx) = self.broadcasts.get_calibration_sender() {
            if let Ok(Some(progress)) = self.calibration.get_progress() {
                log::info!(
                    "[MonitorHandle] Emitting initial calibration progress: {:?}",
                    progress
                );
                let _ = tx.send(progress);
            }
        }

        Ok(())
    }

    /// Confirm the current phase and move the procedure to the next pose.
    ///
    /// Called when the user has captured the upright phase and repositioned
    /// into a slouch. Emits updated progress via the calibration stream.
    ///
    /// # Errors
    /// - `NotInProgress` - No procedure active
    /// - `PhaseIncomplete` - Current phase has not collected enough samples
    pub fn advance_calibration_phase(&self) -> Result<CalibrationProgress, CalibrationError> {
        let progress = self.calibration.advance_phase()?;

        if let Some(tx) = self.broadcasts.get_calibration_sender() {
            let _ = tx.send(progress);
        }

        Ok(progress)
    }

    /// Validate the captured phases and persist the resulting thresholds.
    ///
    /// On success the settings store holds the new thresholds with
    /// `is_calibrated` set, and the loop classifies against them from the
    /// next tick.
    pub fn finish_calibration(&self) -> Result<CalibrationThresholds, CalibrationError> {
        self.calibration.finish()
    }

    /// Discard any active calibration procedure.
    ///
    /// # Returns
    /// * `Ok(true)` - A procedure was discarded
    /// * `Ok(false)` - No procedure was active
    pub fn cancel_calibration(&self) -> Result<bool, CalibrationError> {
        self.calibration.cancel()
    }

    /// Apply a pair of already-averaged posture samples as thresholds.
    ///
    /// One-step alternative to the phased capture: validates ordering and
    /// separation, persists on success. Rejected while a live capture is
    /// active.
    pub fn calibrate(
        &self,
        good_sample: f64,
        bad_sample: f64,
    ) -> Result<CalibrationThresholds, CalibrationError> {
        self.calibration.apply_samples(good_sample, bad_sample)
    }

    /// Progress of the active calibration procedure, if any.
    pub fn calibration_progress(&self) -> Result<Option<CalibrationProgress>, CalibrationError> {
        self.calibration.get_progress()
    }
}

// ========================================================================
// SAMPLING LOOP
// ========================================================================

/// Body of the sampling thread.
///
/// Owns the pipeline state for one run and releases the frame source
/// exactly once, on shutdown or after a fatal source error.
fn run_loop(ctx: LoopContext, mut shutdown_rx: watch::Receiver<bool>) {
    // Spawn a dedicated runtime rather than assuming one exists; the
    // handle may be driven from a plain thread with no async context.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime for sampling loop");

    rt.block_on(async move {
        let tick = Duration::from_millis(ctx.config.sampling.tick_interval_ms.max(1));
        let mut interval = tokio::time::interval(tick);
        // A slow source skips ticks instead of queueing a burst behind it.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut state = LoopState::new(&ctx.config);

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if !state.run_tick(&ctx) {
                        break;
                    }
                }
            }
        }

        if let Err(err) = ctx.source.stop() {
            log_source_error(&err, "release_source");
        }
        ctx.running.store(false, Ordering::SeqCst);
    });
}

/// Per-run pipeline state owned by the sampling thread.
struct LoopState {
    filter: SmoothingFilter,
    classifier: PostureClassifier,
    tick: u64,
    last_smoothed: Option<f64>,
    /// Latch behind the edge-triggered `CalibrationRequired` event
    calibration_was_required: bool,
    heartbeat_every_ticks: u64,
}

impl LoopState {
    fn new(config: &MonitorConfig) -> Self {
        Self {
            filter: SmoothingFilter::new(config.sampling.smoothing_window),
            classifier: PostureClassifier::new(config.classifier.away_after_misses),
            tick: 0,
            last_smoothed: None,
            calibration_was_required: false,
            heartbeat_every_ticks: config.sampling.heartbeat_every_ticks.max(1),
        }
    }

    /// Run one sampling tick.
    ///
    /// Returns false when the loop must halt: any source error other than
    /// a transient read failure is fatal and surfaces as a `SourceError`
    /// event before the loop exits.
    fn run_tick(&mut self, ctx: &LoopContext) -> bool {
        self.tick = self.tick.wrapping_add(1);

        let settings = ctx.settings.snapshot();
        let thresholds = CalibrationThresholds::from_settings(&settings);
        let params = ClassifierParams::from_settings(&settings);

        match ctx.source.sample() {
            Ok(Sample::Detected(raw_y)) => {
                let smoothed = self.filter.push(raw_y.clamp(0.0, 1.0));
                self.last_smoothed = Some(smoothed);

                if ctx.calibration.is_active() {
                    self.feed_calibration(ctx, smoothed);
                } else {
                    let outcome = self.classifier.observe(smoothed, &thresholds, &params);
                    self.publish_classification(ctx, outcome);
                }
            }
            Ok(Sample::NoDetection) => {
                self.register_miss(ctx);
            }
            Err(SourceError::ReadFailure { reason }) => {
                log::warn!(
                    "[MonitorHandle] Frame read failed, counting as a miss: {}",
                    reason
                );
                self.register_miss(ctx);
            }
            Err(err) => {
                log_source_error(&err, "sample_tick");
                let _ = ctx.events_tx.send(MonitorEvent::SourceError {
                    message: err.to_string(),
                });
                return false;
            }
        }

        self.emit_heartbeat(ctx);
        true
    }

    /// Feed one smoothed measurement into the active capture procedure.
    fn feed_calibration(&mut self, ctx: &LoopContext, smoothed: f64) {
        match ctx.calibration.feed_sample(smoothed) {
            Ok(Some(progress)) => {
                let _ = ctx.calibration_tx.send(progress);
            }
            Ok(None) => {
                // Phase already full; the procedure waits for an explicit
                // advance or finish.
            }
            Err(err) => log_calibration_error(&err, "feed_sample"),
        }
    }

    /// Record a tick with no usable detection.
    fn register_miss(&mut self, ctx: &LoopContext) {
        // During capture a dropped frame just lengthens the phase.
        if ctx.calibration.is_active() {
            return;
        }

        let outcome = self.classifier.miss();
        if outcome.changed {
            // The only transition a miss can produce is into Away. Clear
            // the window so stale positions do not bleed into the first
            // readings after the subject returns.
            self.filter.reset();
            self.last_smoothed = None;

            log::info!("[MonitorHandle] Posture state changed: {:?}", outcome.state);
            let _ = ctx.events_tx.send(MonitorEvent::PostureChanged {
                state: outcome.state,
            });
        }
        // Miss ticks leave the calibration-required latch alone; only a
        // classified detection can lower it.
    }

    /// Publish the outcome of a classified detection.
    fn publish_classification(&mut self, ctx: &LoopContext, outcome: TickOutcome) {
        if outcome.changed {
            log::info!("[MonitorHandle] Posture state changed: {:?}", outcome.state);
            let _ = ctx.events_tx.send(MonitorEvent::PostureChanged {
                state: outcome.state,
            });
        }

        if outcome.calibration_required && !self.calibration_was_required {
            let _ = ctx.events_tx.send(MonitorEvent::CalibrationRequired);
        }
        self.calibration_was_required = outcome.calibration_required;
    }

    /// Emit a diagnostic observation every `heartbeat_every_ticks` ticks.
    ///
    /// Skipped until the filter has seen at least one detection, so the
    /// heartbeat never fabricates a position.
    fn emit_heartbeat(&self, ctx: &LoopContext) {
        if self.tick % self.heartbeat_every_ticks != 0 {
            return;
        }
        if let Some(smoothed_y) = self.last_smoothed {
            let _ = ctx.observations_tx.send(Observation {
                tick: self.tick,
                smoothed_y,
                state: self.classifier.state(),
            });
        }
    }
}

// ========================================================================
// TEST HELPERS
// ========================================================================

#[cfg(test)]
mod tests;
