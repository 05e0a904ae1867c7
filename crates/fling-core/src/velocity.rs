#![forbid(unsafe_code)]

//! Release-velocity estimation from a trailing input window.
//!
//! Raw pointer deltas are jittery: individual events swing wildly in both
//! spacing and magnitude, and the final event of a gesture is often a
//! near-stationary settle. Estimating the flick velocity from the last
//! event alone under- or over-shoots badly. Instead we keep a short ring of
//! recent `(timestamp, delta)` pairs and take a recency-weighted mean of
//! the per-interval velocities, so the estimate leans on the most recent
//! motion without being captured by a single noisy sample.
//!
//! # Invariants
//!
//! 1. The window never holds more than `max_len` samples nor any sample
//!    older than `max_age` relative to the newest.
//! 2. Same-timestamp pushes merge (no zero-width intervals).
//! 3. `estimate` of an empty window is 0.

use std::collections::VecDeque;

use crate::clock::Millis;

/// Trailing window of `(timestamp, delta)` pairs for one axis.
#[derive(Debug, Clone)]
pub struct VelocityWindow {
    samples: VecDeque<(Millis, f64)>,
    max_len: usize,
    max_age: Millis,
}

impl VelocityWindow {
    /// Create a window bounded by `max_len` samples and `max_age`
    /// milliseconds, whichever trims first.
    #[must_use]
    pub fn new(max_len: usize, max_age: Millis) -> Self {
        let max_len = max_len.max(1);
        Self {
            samples: VecDeque::with_capacity(max_len + 1),
            max_len,
            max_age: max_age.max(1.0),
        }
    }

    /// Record a delta observed at `t`. Same-timestamp deltas merge.
    pub fn push(&mut self, t: Millis, delta: f64) {
        if let Some((last_t, last_d)) = self.samples.back_mut() {
            if t <= *last_t {
                *last_d += delta;
                return;
            }
        }
        self.samples.push_back((t, delta));
        self.trim(t);
    }

    fn trim(&mut self, newest: Millis) {
        while self.samples.len() > self.max_len {
            self.samples.pop_front();
        }
        while let Some(&(t, _)) = self.samples.front() {
            if newest - t <= self.max_age {
                break;
            }
            self.samples.pop_front();
        }
    }

    /// Discard all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Estimate the current velocity in dp/ms.
    ///
    /// With two or more samples: a recency-weighted mean of per-interval
    /// velocities (`delta_i / (t_i − t_{i−1})`, weight rising linearly with
    /// recency). With a single sample: the delta spread over the time since
    /// it arrived (floored to 1 ms). Empty: 0.
    #[must_use]
    pub fn estimate(&self, now: Millis) -> f64 {
        match self.samples.len() {
            0 => 0.0,
            1 => {
                let (t, d) = self.samples[0];
                d / (now - t).max(1.0)
            }
            _ => {
                let mut weighted = 0.0;
                let mut total_weight = 0.0;
                for i in 1..self.samples.len() {
                    let (t_prev, _) = self.samples[i - 1];
                    let (t, d) = self.samples[i];
                    let dt = (t - t_prev).max(f64::EPSILON);
                    let weight = i as f64;
                    weighted += weight * (d / dt);
                    total_weight += weight;
                }
                weighted / total_weight
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
