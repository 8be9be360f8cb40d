use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::Stream;
use tokio::runtime::Builder;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::calibration::CalibrationProgress;
use crate::monitor::events::{MonitorEvent, Observation};
use crate::settings::{Settings, SettingsStore};

use super::MonitorHandle;

impl MonitorHandle {
    // ========================================================================
    // STREAM SUBSCRIPTIONS
    // ========================================================================

    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<MonitorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(mut broadcast_rx) = self.broadcasts.subscribe_events() {
            std::thread::spawn(move || {
                let rt = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("Failed to create Tokio runtime");
                rt.block_on(async move {
                    while let Ok(event) = broadcast_rx.recv().await {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                });
            });
        }

        rx
    }

    pub fn subscribe_observations(&self) -> mpsc::UnboundedReceiver<Observation> {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(mut broadcast_rx) = self.broadcasts.subscribe_observations() {
            std::thread::spawn(move || {
                let rt = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("Failed to create Tokio runtime");
                rt.block_on(async move {
                    while let Ok(observation) = broadcast_rx.recv().await {
                        if tx.send(observation).is_err() {
                            break;
                        }
                    }
                });
            });
        }

        rx
    }

    pub fn subscribe_calibration(&self) -> mpsc::UnboundedReceiver<CalibrationProgress> {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(mut broadcast_rx) = self.broadcasts.subscribe_calibration() {
            std::thread::spawn(move || {
                let rt = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("Failed to create Tokio runtime");
                rt.block_on(async move {
                    while let Ok(progress) = broadcast_rx.recv().await {
                        if tx.send(progress).is_err() {
                            break;
                        }
                    }
                });
            });
        }

        rx
    }

    /// Direct broadcast receiver for monitor events.
    ///
    /// Unlike `subscribe_events` this spawns no bridge thread; async
    /// consumers can await it in their own runtime.
    pub fn events_receiver(&self) -> Option<broadcast::Receiver<MonitorEvent>> {
        self.broadcasts.subscribe_events()
    }

    /// Direct broadcast receiver for heartbeat observations.
    pub fn observations_receiver(&self) -> Option<broadcast::Receiver<Observation>> {
        self.broadcasts.subscribe_observations()
    }

    /// Direct broadcast receiver for calibration progress.
    pub fn calibration_receiver(&self) -> Option<broadcast::Receiver<CalibrationProgress>> {
        self.broadcasts.subscribe_calibration()
    }

    // ========================================================================
    // ASYNC STREAM ADAPTERS
    // ========================================================================

    pub async fn events_stream(&self) -> impl Stream<Item = MonitorEvent> + Unpin {
        UnboundedReceiverStream::new(self.subscribe_events())
    }

    pub async fn observations_stream(&self) -> impl Stream<Item = Observation> + Unpin {
        UnboundedReceiverStream::new(self.subscribe_observations())
    }

    pub async fn calibration_stream(&self) -> impl Stream<Item = CalibrationProgress> + Unpin {
        UnboundedReceiverStream::new(self.subscribe_calibration())
    }

    // ========================================================================
    // STATE QUERIES
    // ========================================================================

    /// Check whether the sampling loop is running (best effort).
    ///
    /// Turns false on its own when the loop halts after a fatal source
    /// error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Check whether a calibration procedure is collecting samples.
    pub fn is_calibration_active(&self) -> bool {
        self.calibration.is_active()
    }

    /// Snapshot the current persisted settings.
    pub fn settings_snapshot(&self) -> Settings {
        self.settings.snapshot()
    }

    /// Shared handle to the settings store, for integrators that apply
    /// user edits while the loop is running.
    pub fn settings_handle(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.settings)
    }
}
