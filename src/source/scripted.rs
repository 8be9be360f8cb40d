use std::sync::Mutex;

use crate::error::SourceError;

use super::{FrameSource, Sample};

/// Deterministic frame source replaying a fixed script.
///
/// Each script entry is one tick: `Some(y)` is a detection, `None` a missed
/// detection. When the script runs out the source reports itself
/// unavailable, which the monitor treats as fatal; replay tooling relies on
/// that to terminate the run.
pub struct ScriptedSource {
    inner: Mutex<ScriptState>,
}

struct ScriptState {
    frames: Vec<Option<f64>>,
    cursor: usize,
    started: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Option<f64>>) -> Self {
        Self {
            inner: Mutex::new(ScriptState {
                frames,
                cursor: 0,
                started: false,
            }),
        }
    }

    /// Convenience constructor for scripts with no missed detections
    pub fn from_values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Some).collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ScriptState>, SourceError> {
        self.inner.lock().map_err(|_| SourceError::LockPoisoned {
            component: "ScriptedSource".to_string(),
        })
    }
}

impl FrameSource for ScriptedSource {
    fn start(&self, _camera_index: u32) -> Result<(), SourceError> {
        let mut state = self.lock()?;
        if state.started {
            return Err(SourceError::AlreadyRunning);
        }
        state.started = true;
        state.cursor = 0;
        Ok(())
    }

    fn sample(&self) -> Result<Sample, SourceError> {
        let mut state = self.lock()?;
        if !state.started {
            return Err(SourceError::NotRunning);
        }
        if state.cursor >= state.frames.len() {
            return Err(SourceError::Unavailable {
                details: format!("script exhausted after {} frames", state.frames.len()),
            });
        }
        let frame = state.frames[state.cursor];
        state.cursor += 1;
        match frame {
            Some(y) => Ok(Sample::Detected(y)),
            None => Ok(Sample::NoDetection),
        }
    }

    fn stop(&self) -> Result<(), SourceError> {
        let mut state = self.lock()?;
        state.started = false;
        Ok(())
    }
}
