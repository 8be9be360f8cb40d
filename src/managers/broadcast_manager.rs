// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::calibration::CalibrationProgress;
use crate::monitor::events::{MonitorEvent, Observation};

/// Manages all tokio broadcast channels
///
/// Single Responsibility: Broadcast channel lifecycle and subscription
///
/// This manager centralizes all broadcast channel creation, storage, and
/// subscription handling. It provides a clean interface for:
/// - Initializing broadcast channels with appropriate buffer sizes
/// - Subscribing to broadcast channels for multiple consumers
/// - Managing channel lifecycle (creation, cleanup)
///
/// # Channel Types
/// - Events: Posture changes, calibration prompts, and source faults
/// - Observations: Periodic smoothed-signal heartbeats for debug surfaces
/// - Calibration: Progress updates during the calibration workflow
pub struct BroadcastChannelManager {
    events: Arc<Mutex<Option<broadcast::Sender<MonitorEvent>>>>,
    observations: Arc<Mutex<Option<broadcast::Sender<Observation>>>>,
    calibration: Arc<Mutex<Option<broadcast::Sender<CalibrationProgress>>>>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with all channels uninitialized
    ///
    /// Channels must be explicitly initialized via init_* methods before use.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(None)),
            observations: Arc::new(Mutex::new(None)),
            calibration: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // EVENTS CHANNEL
    // ========================================================================

    /// Initialize the monitor event broadcast channel
    ///
    /// Returns sender for the sampling loop to publish events. Creates a
    /// broadcast channel with 100-message buffer to cover slow subscribers.
    ///
    /// # Notes
    /// - Buffer size: 100 messages (events are transition-driven, so this
    ///   covers minutes of typical activity)
    /// - Multiple subscribers supported via broadcast pattern
    /// - Old messages dropped if buffer fills (lagged subscribers)
    pub fn init_events(&self) -> broadcast::Sender<MonitorEvent> {
        let (tx, _) = broadcast::channel(100);
        *self.events.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to monitor events
    ///
    /// Returns a receiver for consuming events. Each subscriber receives
    /// independent copies of all messages via the broadcast channel.
    ///
    /// # Returns
    /// `Option<broadcast::Receiver<MonitorEvent>>` - Receiver or None if not initialized
    pub fn subscribe_events(&self) -> Option<broadcast::Receiver<MonitorEvent>> {
        self.events.lock().unwrap().as_ref().map(|tx| tx.subscribe())
    }

    /// Get a clone of the current event sender, if initialized
    ///
    /// Used by the sampling loop so publishers always target the live
    /// channel rather than a sender captured at init time.
    pub fn get_events_sender(&self) -> Option<broadcast::Sender<MonitorEvent>> {
        self.events.lock().unwrap().as_ref().cloned()
    }

    // ========================================================================
    // OBSERVATIONS CHANNEL (DEBUG)
    // ========================================================================

    /// Initialize the observation broadcast channel
    ///
    /// Returns sender for the sampling loop to publish heartbeat
    /// observations. Creates a broadcast channel with 100-message buffer.
    ///
    /// # Notes
    /// - Buffer size: 100 messages
    /// - Used for diagnostics and debug visualization only
    /// - Not part of the classification path
    pub fn init_observations(&self) -> broadcast::Sender<Observation> {
        let (tx, _) = broadcast::channel(100);
        *self.observations.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to heartbeat observations
    ///
    /// # Returns
    /// `Option<broadcast::Receiver<Observation>>` - Receiver or None if not initialized
    pub fn subscribe_observations(&self) -> Option<broadcast::Receiver<Observation>> {
        self.observations
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Get a clone of the current observation sender, if initialized
    pub fn get_observations_sender(&self) -> Option<broadcast::Sender<Observation>> {
        self.observations.lock().unwrap().as_ref().cloned()
    }

    // ========================================================================
    // CALIBRATION CHANNEL
    // ========================================================================

    /// Initialize calibration broadcast channel
    ///
    /// Returns sender for the sampling loop to publish capture progress.
    /// Creates a broadcast channel with 50-message buffer (sufficient for
    /// progress updates during 30-sample collection).
    ///
    /// # Notes
    /// - Buffer size: 50 messages (sufficient for 30 samples with margin)
    /// - Progress includes: phase, sample count, samples needed
    pub fn init_calibration(&self) -> broadcast::Sender<CalibrationProgress> {
        let (tx, _) = broadcast::channel(50);
        *self.calibration.lock().unwrap() = Some(tx.clone());
        tx
    }

    /// Subscribe to calibration progress
    ///
    /// # Returns
    /// `Option<broadcast::Receiver<CalibrationProgress>>` - Receiver or None if not initialized
    pub fn subscribe_calibration(&self) -> Option<broadcast::Receiver<CalibrationProgress>> {
        self.calibration
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Get a clone of the current calibration progress sender, if initialized
    ///
    /// Lets the calibration workflow emit progress (initial state, phase
    /// advances) outside the sampling loop.
    pub fn get_calibration_sender(&self) -> Option<broadcast::Sender<CalibrationProgress>> {
        self.calibration.lock().unwrap().as_ref().cloned()
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
