use super::*;

use std::sync::atomic::AtomicUsize;
use std::time::Instant;

use tempfile::TempDir;

use crate::classifier::PostureState;
use crate::config::{CalibrationConfig, ClassifierConfig, SamplingConfig};
use crate::source::ScriptedSource;

/// Frame source that counts lifecycle calls, for release accounting.
#[derive(Default)]
struct CountingSource {
    started: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl FrameSource for CountingSource {
    fn start(&self, _camera_index: u32) -> Result<(), SourceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sample(&self) -> Result<Sample, SourceError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(SourceError::NotRunning);
        }
        Ok(Sample::Detected(0.5))
    }

    fn stop(&self) -> Result<(), SourceError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        sampling: SamplingConfig {
            tick_interval_ms: 5,
            smoothing_window: 5,
            heartbeat_every_ticks: 5,
        },
        classifier: ClassifierConfig {
            away_after_misses: 3,
        },
        calibration: CalibrationConfig {
            samples_per_phase: 3,
            min_threshold_separation: 0.02,
        },
    }
}

fn test_store(dir: &TempDir) -> Arc<SettingsStore> {
    Arc::new(SettingsStore::open(dir.path().join("settings.json")))
}

fn calibrated_store(dir: &TempDir) -> Arc<SettingsStore> {
    let store = test_store(dir);
    store
        .update(|settings| {
            settings.good_posture_y = 0.4;
            settings.bad_posture_y = 0.6;
            settings.is_calibrated = true;
            settings.sensitivity = 1.0;
        })
        .unwrap();
    store
}

fn wait_until<F: Fn() -> bool>(deadline_ms: u64, condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_millis(deadline_ms);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn drain_events(rx: &mut broadcast::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn test_start_twice_reports_already_running() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.5; 400]));
    let handle = MonitorHandle::with_settings(source, calibrated_store(&dir), fast_config());

    handle.start().unwrap();
    assert!(handle.is_running());
    assert!(matches!(handle.start(), Err(SourceError::AlreadyRunning)));

    handle.stop().unwrap();
    assert!(!handle.is_running());
}

#[test]
fn test_stop_without_start_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.5]));
    let handle = MonitorHandle::with_settings(source, test_store(&dir), fast_config());

    assert!(handle.stop().is_ok());
    assert!(!handle.is_running());
}

#[test]
fn test_stop_twice_releases_source_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(CountingSource::default());
    let monitor_source: Arc<dyn FrameSource> = source.clone();
    let handle = MonitorHandle::with_settings(monitor_source, calibrated_store(&dir), fast_config());

    handle.start().unwrap();
    std::thread::sleep(Duration::from_millis(25));
    handle.stop().unwrap();
    handle.stop().unwrap();

    assert_eq!(source.start_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.stop_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_source_open_failure_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.5; 10]));
    // Occupy the source from outside so the handle's open attempt fails.
    source.start(0).unwrap();

    let monitor_source: Arc<dyn FrameSource> = source.clone();
    let handle = MonitorHandle::with_settings(monitor_source, test_store(&dir), fast_config());

    assert!(matches!(handle.start(), Err(SourceError::AlreadyRunning)));
    assert!(!handle.is_running());
    assert!(handle.stop().is_ok());
}

#[test]
fn test_loop_halts_after_source_exhaustion() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.3, 0.3, 0.3]));
    let handle = MonitorHandle::with_settings(source, calibrated_store(&dir), fast_config());
    let mut events_rx = handle.events_receiver().unwrap();

    handle.start().unwrap();
    assert!(wait_until(2000, || !handle.is_running()));

    let events = drain_events(&mut events_rx);
    assert!(matches!(
        events.first(),
        Some(MonitorEvent::PostureChanged {
            state: PostureState::Good
        })
    ));
    match events.last() {
        Some(MonitorEvent::SourceError { message }) => {
            assert!(message.contains("script exhausted"));
        }
        other => panic!("expected a terminal source error, got {:?}", other),
    }

    // Stopping after a self-halt is still clean.
    handle.stop().unwrap();
}

#[test]
fn test_restart_after_halt_replays_script() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.3, 0.3]));
    let handle = MonitorHandle::with_settings(source, calibrated_store(&dir), fast_config());

    handle.start().unwrap();
    assert!(wait_until(2000, || !handle.is_running()));

    // The script rewinds on start, so a fresh run works.
    handle.start().unwrap();
    assert!(handle.is_running());
    assert!(wait_until(2000, || !handle.is_running()));
    handle.stop().unwrap();
}

#[test]
fn test_uncalibrated_run_emits_single_calibration_required() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(ScriptedSource::from_values(&[0.5; 40]));
    let handle = MonitorHandle::with_settings(source, test_store(&dir), fast_config());
    let mut events_rx = handle.events_receiver().unwrap();

    handle.start().unwrap();
    assert!(wait_until(2000, || !handle.is_running()));

    let events = drain_events(&mut events_rx);
    let required = events
        .iter()
        .filter(|event| matches!(event, MonitorEvent::CalibrationRequired))
        .count();
    assert_eq!(required, 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, MonitorEvent::PostureChanged { .. })));

    handle.stop().unwrap();
}
