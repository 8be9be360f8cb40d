use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SourceError;

use super::{FrameSource, Sample};

/// Head height the simulated subject starts at
const START_Y: f64 = 0.4;

/// Per-tick measurement noise amplitude
const JITTER: f64 = 0.004;

/// Fraction of the gap to the drift target closed per tick
const DRIFT_RATE: f64 = 0.05;

/// Probability per tick of picking a new drift target
const RETARGET_PROBABILITY: f64 = 0.02;

/// Probability per tick of a missed detection
const MISS_PROBABILITY: f64 = 0.01;

/// Seeded pseudo-random frame source for demos and soak runs.
///
/// Simulates a subject whose head height drifts between postures with
/// per-frame jitter and occasional missed detections. The same seed always
/// produces the same sequence, and restarting replays it from the top.
pub struct SyntheticSource {
    inner: Mutex<DriftState>,
}

struct DriftState {
    seed: u64,
    rng: StdRng,
    current_y: f64,
    target_y: f64,
    started: bool,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(DriftState {
                seed,
                rng: StdRng::seed_from_u64(seed),
                current_y: START_Y,
                target_y: START_Y,
                started: false,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DriftState>, SourceError> {
        self.inner.lock().map_err(|_| SourceError::LockPoisoned {
            component: "SyntheticSource".to_string(),
        })
    }
}

impl FrameSource for SyntheticSource {
    fn start(&self, _camera_index: u32) -> Result<(), SourceError> {
        let mut state = self.lock()?;
        if state.started {
            return Err(SourceError::AlreadyRunning);
        }
        state.started = true;
        state.rng = StdRng::seed_from_u64(state.seed);
        state.current_y = START_Y;
        state.target_y = START_Y;
        Ok(())
    }

    fn sample(&self) -> Result<Sample, SourceError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if !state.started {
            return Err(SourceError::NotRunning);
        }

        if state.rng.gen_bool(MISS_PROBABILITY) {
            return Ok(Sample::NoDetection);
        }

        if state.rng.gen_bool(RETARGET_PROBABILITY) {
            state.target_y = state.rng.gen_range(0.25..0.80);
        }

        let jitter = state.rng.gen_range(-JITTER..JITTER);
        let step = (state.target_y - state.current_y) * DRIFT_RATE;
        state.current_y = (state.current_y + step + jitter).clamp(0.0, 1.0);
        Ok(Sample::Detected(state.current_y))
    }

    fn stop(&self) -> Result<(), SourceError> {
        let mut state = self.lock()?;
        state.started = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(source: &SyntheticSource, count: usize) -> Vec<Sample> {
        (0..count).map(|_| source.sample().unwrap()).collect()
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = SyntheticSource::new(42);
        let b = SyntheticSource::new(42);
        a.start(0).unwrap();
        b.start(0).unwrap();

        assert_eq!(collect(&a, 50), collect(&b, 50));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = SyntheticSource::new(1);
        let b = SyntheticSource::new(2);
        a.start(0).unwrap();
        b.start(0).unwrap();

        assert_ne!(collect(&a, 50), collect(&b, 50));
    }

    #[test]
    fn test_values_stay_in_range() {
        let source = SyntheticSource::new(7);
        source.start(0).unwrap();

        for sample in collect(&source, 200) {
            if let Sample::Detected(y) = sample {
                assert!((0.0..=1.0).contains(&y), "out of range: {}", y);
            }
        }
    }

    #[test]
    fn test_restart_replays_sequence() {
        let source = SyntheticSource::new(42);
        source.start(0).unwrap();
        let first = collect(&source, 20);
        source.stop().unwrap();

        source.start(0).unwrap();
        assert_eq!(collect(&source, 20), first);
    }

    #[test]
    fn test_sample_before_start_errors() {
        let source = SyntheticSource::new(42);
        assert_eq!(source.sample().unwrap_err(), SourceError::NotRunning);
    }

    #[test]
    fn test_occasionally_misses_detection() {
        let source = SyntheticSource::new(42);
        source.start(0).unwrap();

        let misses = collect(&source, 1000)
            .iter()
            .filter(|sample| **sample == Sample::NoDetection)
            .count();
        assert!(misses > 0, "expected at least one miss in 1000 ticks");
    }
}
