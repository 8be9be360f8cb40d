//! Trace files: recorded detection sequences for replay.
//!
//! A trace is a small JSON document listing per-tick frame samples, with
//! `null` marking a missed detection. Traces convert into a
//! [`ScriptedSource`] so recorded sessions can be replayed through the
//! full pipeline by tests and the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::source::ScriptedSource;

/// Recorded per-tick samples with optional capture cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    /// Tick interval the trace was captured at, when known
    #[serde(default)]
    pub tick_interval_ms: Option<u64>,
    /// Normalized head heights per tick; `null` marks a missed detection
    pub samples: Vec<Option<f64>>,
}

impl Trace {
    /// Parse trace contents from JSON and validate invariants.
    pub fn from_json(data: &str) -> Result<Self, SourceError> {
        let trace: Trace = serde_json::from_str(data)
            .map_err(|err| trace_error(format!("failed to parse trace JSON: {}", err)))?;
        trace.validate()?;
        Ok(trace)
    }

    /// Load and validate a trace file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(&path).map_err(|err| {
            trace_error(format!(
                "failed to read trace file {:?}: {}",
                path.as_ref(),
                err
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Convert the trace into a replayable frame source.
    pub fn into_source(self) -> ScriptedSource {
        ScriptedSource::new(self.samples)
    }

    /// Number of ticks recorded in the trace.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.samples.is_empty() {
            return Err(trace_error("trace must contain at least one sample"));
        }
        if self.tick_interval_ms == Some(0) {
            return Err(trace_error("trace tick_interval_ms must be > 0"));
        }
        if let Some(value) = self
            .samples
            .iter()
            .flatten()
            .find(|value| !(0.0..=1.0).contains(*value))
        {
            return Err(trace_error(format!(
                "trace sample {} outside the normalized 0..=1 range",
                value
            )));
        }
        Ok(())
    }
}

fn trace_error(message: impl Into<String>) -> SourceError {
    SourceError::Unavailable {
        details: message.into(),
    }
}
