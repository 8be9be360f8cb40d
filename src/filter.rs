// Rolling-mean smoothing for raw landmark positions

use std::collections::VecDeque;

/// Fixed-capacity rolling mean over recent detections
///
/// Jitter in per-frame landmark positions would otherwise cause the
/// classifier to flap near a threshold. The filter keeps the last
/// `capacity` values and reports their arithmetic mean; until the window
/// fills it averages whatever has arrived so far.
#[derive(Debug)]
pub struct SmoothingFilter {
    window: VecDeque<f64>,
    capacity: usize,
}

impl SmoothingFilter {
    /// Create a filter holding up to `capacity` recent values
    ///
    /// A capacity of 0 is treated as 1 (pass-through).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new raw value and return the current smoothed mean
    pub fn push(&mut self, value: f64) -> f64 {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        let sum: f64 = self.window.iter().sum();
        sum / self.window.len() as f64
    }

    /// Discard all buffered values
    ///
    /// Used when the subject leaves the frame so stale positions do not
    /// bleed into the first readings after they return.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
