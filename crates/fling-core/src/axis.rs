#![forbid(unsafe_code)]

//! Per-axis scroll state machine.
//!
//! Each axis runs one instance of [`AxisState`]: it consumes classified
//! deltas and control events from its [`AxisLog`] and advances a
//! time-continuous position function that the render loop samples. Axes are
//! fully independent; the aggregator owns one machine per axis and routes
//! events.
//!
//! # State Machine
//!
//! - **Idle**: no motion, no pending input. Position constant.
//! - **Tracking**: the device is actively delivering deltas. Position is
//!   the sum of applied deltas; the release velocity is estimated from a
//!   recency-weighted trailing window. Quiescence (no input for 30 ms
//!   without a release) drops back to Idle.
//! - **Kinetic**: free glide after a release (or a smoothed wheel step),
//!   decaying exponentially. Ends at the velocity floor or at an edge:
//!   bouncing edges hand over to Overscroll, hard edges clamp to Idle.
//! - **Overscroll**: past a bouncing edge. While dragged, incoming deltas
//!   meet rubber-band resistance; when carried here kinetically, the glide
//!   continues with a much stiffer decay until the velocity floor.
//! - **BounceBack**: critically damped spring returning to the violated
//!   edge; settles to Idle within half a dp of the edge.
//!
//! # Invariants
//!
//! 1. Position leaves `[0, max]` only in Overscroll or BounceBack, and only
//!    past an edge whose bounce flag is set; with bounce off the position
//!    is clamped.
//! 2. Every return to Idle or Tracking with an out-of-range position routes
//!    through BounceBack.
//! 3. `|v|` never grows during Kinetic; a from-rest BounceBack approaches
//!    its edge monotonically.
//! 4. Committing reads advance the conceptual clock monotonically; events
//!    stamped earlier than the committed clock apply at the committed
//!    clock, so sampling is deterministic for a given event/query sequence.
//!
//! # Failure Modes
//!
//! - A host that stops querying loses the oldest unread deltas once the
//!   log ring wraps (bounded memory; the gesture resumes from fresher
//!   input).
//! - A release with no delta since the previous release is dropped.

use crate::clock::Millis;
use crate::geometry::AxisBounds;
use crate::log::{AxisLog, LogEvent};
use crate::physics::{Glide, ReturnSpring, overscroll_resistance};
use crate::velocity::VelocityWindow;

/// Saturation bound for forced repositions, dp.
const MAX_FORCE_DP: f64 = 1.0e9;

/// The externally visible phase of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// No motion, nothing pending.
    #[default]
    Idle,
    /// Direct finger/device tracking.
    Tracking,
    /// Free glide under friction.
    Kinetic,
    /// Past a bouncing edge (dragged or carried).
    Overscroll,
    /// Springing back to the nearest edge.
    BounceBack,
}

/// Tuning knobs for the motion model.
///
/// These shape feel, not contract: any values keep the state machine's
/// invariants intact.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionTuning {
    /// Kinetic decay time constant after a flick, ms (default: 325).
    pub fling_tau_ms: f64,
    /// Decay constant for smoothed wheel steps, ms (default: 35, so a
    /// step completes to within a dp in under 200 ms).
    pub wheel_glide_tau_ms: f64,
    /// Decay constant while gliding past a bouncing edge, ms (default: 80).
    pub overscroll_tau_ms: f64,
    /// Velocity floor in dp/ms below which motion stops (default: 0.02).
    pub min_velocity: f64,
    /// Cap on the kinetic entry velocity, dp/ms (default: 6.0). Reported
    /// velocities are uncapped.
    pub max_fling_velocity: f64,
    /// Angular frequency of the bounce-back spring, 1/ms (default: 0.02;
    /// a ~100 dp excursion settles in roughly 350 ms).
    pub bounce_omega: f64,
    /// Distance from the edge at which a bounce is considered settled, dp
    /// (default: 0.5).
    pub settle_epsilon_dp: f64,
    /// Rubber-band stiffening rate `k` in `1/(1 + k·|x|/viewport)`
    /// (default: 3.0).
    pub overscroll_resistance_k: f64,
    /// Input silence after which Tracking drops to Idle, ms (default: 30).
    pub quiescence_ms: f64,
    /// Maximum samples retained for release-velocity estimation
    /// (default: 5).
    pub velocity_window_len: usize,
    /// Maximum age of retained velocity samples, ms (default: 80).
    pub velocity_window_ms: f64,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            fling_tau_ms: 325.0,
            wheel_glide_tau_ms: 35.0,
            overscroll_tau_ms: 80.0,
            min_velocity: 0.02,
            max_fling_velocity: 6.0,
            bounce_omega: 0.02,
            settle_epsilon_dp: 0.5,
            overscroll_resistance_k: 3.0,
            quiescence_ms: 30.0,
            velocity_window_len: 5,
            velocity_window_ms: 80.0,
        }
    }
}

impl MotionTuning {
    /// Clamp degenerate values (zero time constants, zero thresholds) that
    /// would stall or divide the closed forms.
    fn sanitized(mut self) -> Self {
        self.fling_tau_ms = self.fling_tau_ms.max(1.0);
        self.wheel_glide_tau_ms = self.wheel_glide_tau_ms.max(1.0);
        self.overscroll_tau_ms = self.overscroll_tau_ms.max(1.0);
        self.min_velocity = self.min_velocity.max(1.0e-4);
        self.max_fling_velocity = self.max_fling_velocity.max(self.min_velocity);
        self.bounce_omega = self.bounce_omega.max(1.0e-4);
        self.settle_epsilon_dp = self.settle_epsilon_dp.max(1.0e-3);
        self.overscroll_resistance_k = self.overscroll_resistance_k.max(0.0);
        self.quiescence_ms = self.quiescence_ms.max(1.0);
        self
    }
}

/// Result of a committing read on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSample {
    /// Sampled position at the prediction target, dp.
    pub position: f64,
    /// Sampled velocity, dp/ms.
    pub velocity: f64,
    /// Whether the axis is in any phase other than Idle after the read.
    pub active: bool,
    /// Whether queued events were consumed by this read.
    pub had_events: bool,
}

/// One axis of a scrollview: event log, velocity window, and the phase
/// anchor of the active closed-form position function.
#[derive(Debug, Clone)]
pub struct AxisState {
    tuning: MotionTuning,
    log: AxisLog,
    window: VelocityWindow,

    phase: Phase,
    /// Anchor instant of the active position function.
    t0: Millis,
    /// Position at the anchor.
    p0: f64,
    /// Velocity at the anchor, dp/ms.
    v0: f64,
    /// Decay constant of the active glide, ms.
    tau: f64,
    /// Whether the active kinetic glide may carry past a bouncing edge.
    rubber_fling: bool,
    /// Overscroll entered kinetically (autonomous) rather than by drag.
    glide_overscroll: bool,
    /// Edge being violated/returned to while in Overscroll or BounceBack.
    edge: f64,

    last_input: Millis,
    sampled_to: Millis,
    /// Total integer dp handed out through pan reads.
    emitted: i64,
    /// A delta has arrived since the last release (release dedup).
    armed_release: bool,
}

impl AxisState {
    /// Create an axis at the (clamped) initial position.
    #[must_use]
    pub fn new(tuning: MotionTuning, initial: f64, bounds: &AxisBounds) -> Self {
        let tuning = tuning.sanitized();
        let initial = if initial.is_finite() { initial } else { 0.0 };
        let p0 = bounds.clamp(initial);
        let window = VelocityWindow::new(tuning.velocity_window_len, tuning.velocity_window_ms);
        let tau = tuning.fling_tau_ms;
        Self {
            tuning,
            log: AxisLog::default(),
            window,
            phase: Phase::Idle,
            t0: 0.0,
            p0,
            v0: 0.0,
            tau,
            rubber_fling: true,
            glide_overscroll: false,
            edge: 0.0,
            last_input: 0.0,
            sampled_to: 0.0,
            emitted: p0.round() as i64,
            armed_release: false,
        }
    }

    /// Current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether queued events are waiting for the next committing read.
    #[inline]
    #[must_use]
    pub fn pending_events(&self) -> bool {
        !self.log.is_empty()
    }

    /// Replace the motion tuning.
    pub fn set_tuning(&mut self, tuning: MotionTuning) {
        let tuning = tuning.sanitized();
        self.window = VelocityWindow::new(tuning.velocity_window_len, tuning.velocity_window_ms);
        self.tuning = tuning;
    }

    /// Queue an event stamped at `at`.
    pub fn push(&mut self, at: Millis, event: LogEvent) {
        self.log.push(at, event);
    }

    /// Drain queued events, advance to the prediction target, and sample.
    ///
    /// This is the committing read: the axis' conceptual clock moves to
    /// `max(now, t_target)` and never back.
    pub fn commit(&mut self, now: Millis, t_target: Millis, bounds: &AxisBounds) -> AxisSample {
        let had_events = self.drain(bounds);
        let now = now.max(self.sampled_to);
        let t = t_target.max(now);
        self.advance(t, bounds);
        self.sampled_to = t;

        AxisSample {
            position: self.sample_position(now, t, bounds),
            velocity: self.sample_velocity(now, t),
            active: self.phase != Phase::Idle,
            had_events,
        }
    }

    /// Committing read returning the unread pan delta in integer dp.
    ///
    /// The delta telescopes against everything previously emitted, so the
    /// sum of pan reads over a session equals the rounded final position
    /// minus the rounded initial one.
    pub fn take_pan(&mut self, now: Millis, t_target: Millis, bounds: &AxisBounds) -> (i64, AxisSample) {
        let sample = self.commit(now, t_target, bounds);
        let total = sample.position.round() as i64;
        let pan = total - self.emitted;
        self.emitted = total;
        (pan, sample)
    }

    /// Synchronously reposition to `target`, stopping all motion.
    ///
    /// In range: Idle. Past a bouncing edge: BounceBack (cancelling any
    /// active spring). Past a hard edge: clamped, Idle.
    pub fn force_to(&mut self, t: Millis, target: f64, bounds: &AxisBounds) {
        let t = t.max(self.sampled_to);
        let target = sanitize_dp(target);
        self.window.clear();
        self.armed_release = false;
        self.glide_overscroll = false;
        self.v0 = 0.0;
        self.t0 = t;

        let over = bounds.overshoot(target);
        if over == 0.0 {
            self.phase = Phase::Idle;
            self.p0 = target;
        } else if bounds.bounces_toward(over) {
            self.phase = Phase::BounceBack;
            self.p0 = target;
            self.edge = bounds.nearest_edge(target);
        } else {
            self.phase = Phase::Idle;
            self.p0 = bounds.clamp(target);
        }
    }

    /// Synchronously reposition by `delta` relative to the current
    /// position, with the same edge handling as [`AxisState::force_to`].
    pub fn force_by(&mut self, t: Millis, delta: f64, bounds: &AxisBounds) {
        let t = t.max(self.sampled_to);
        let p = self.committed_position(t);
        self.force_to(t, p + sanitize_dp(delta), bounds);
    }

    /// React to a geometry change at time `t`: re-clamp unless an
    /// overscroll excursion or bounce is in flight.
    pub fn reclamp(&mut self, t: Millis, bounds: &AxisBounds) {
        match self.phase {
            Phase::Overscroll | Phase::BounceBack => {}
            Phase::Kinetic => {
                // Re-anchor so the remaining glide runs against the new
                // bounds from the current position.
                let glide = self.glide_curve();
                let dt = t.max(self.t0) - self.t0;
                self.p0 = bounds.clamp(glide.position(dt));
                self.v0 = glide.velocity(dt);
                self.t0 = t.max(self.t0);
            }
            Phase::Idle | Phase::Tracking => {
                self.p0 = bounds.clamp(self.p0);
            }
        }
    }

    // -- internals ----------------------------------------------------------

    fn glide_curve(&self) -> Glide {
        Glide {
            p0: self.p0,
            v0: self.v0,
            tau: self.tau,
        }
    }

    fn spring(&self) -> ReturnSpring {
        ReturnSpring::anchored(self.edge, self.p0, self.v0, self.tuning.bounce_omega)
    }

    /// Committed position at `t` (no tracking extrapolation).
    fn committed_position(&self, t: Millis) -> f64 {
        let dt = t - self.t0;
        match self.phase {
            Phase::Idle | Phase::Tracking => self.p0,
            Phase::Overscroll if !self.glide_overscroll => self.p0,
            Phase::Kinetic | Phase::Overscroll => self.glide_curve().position(dt),
            Phase::BounceBack => self.spring().position(dt),
        }
    }

    fn drain(&mut self, bounds: &AxisBounds) -> bool {
        let had = !self.log.is_empty();
        while let Some(entry) = self.log.pop_front() {
            let t = entry.at.max(self.sampled_to);
            self.advance(t, bounds);
            self.apply(t, entry.event, bounds);
        }
        had
    }

    /// Run autonomous transitions (quiescence, glide exhaustion, edge
    /// crossings, bounce settling) up to time `t`.
    fn advance(&mut self, t: Millis, bounds: &AxisBounds) {
        loop {
            match self.phase {
                Phase::Idle => break,
                Phase::Tracking => {
                    let idle_at = self.last_input + self.tuning.quiescence_ms;
                    if t >= idle_at {
                        self.phase = Phase::Idle;
                        self.v0 = 0.0;
                        self.t0 = idle_at;
                        self.window.clear();
                    }
                    break;
                }
                Phase::Overscroll if !self.glide_overscroll => break,
                Phase::Overscroll => {
                    let glide = self.glide_curve();
                    let stop_at = self.t0 + glide.time_to_speed(self.tuning.min_velocity);
                    if t < stop_at {
                        break;
                    }
                    let p = glide.position(stop_at - self.t0);
                    self.enter_bounce(stop_at, p, bounds);
                    // The bounce may settle before `t` as well; loop.
                }
                Phase::Kinetic => {
                    let glide = self.glide_curve();
                    let stop_at = self.t0 + glide.time_to_speed(self.tuning.min_velocity);
                    let target_edge = if self.v0 > 0.0 { bounds.max } else { 0.0 };
                    let cross_at = glide.time_to_reach(target_edge).map(|dt| self.t0 + dt);

                    match cross_at {
                        Some(cross) if cross <= stop_at && cross <= t => {
                            let v_at_edge = glide.velocity(cross - self.t0);
                            if self.rubber_fling && bounds.bounces_toward(self.v0) {
                                // Cap the carried velocity so the excursion
                                // (v·τ) never exceeds the viewport extent.
                                let cap =
                                    bounds.viewport.max(1.0) / self.tuning.overscroll_tau_ms;
                                self.phase = Phase::Overscroll;
                                self.glide_overscroll = true;
                                self.edge = target_edge;
                                self.t0 = cross;
                                self.p0 = target_edge;
                                self.v0 = v_at_edge.clamp(-cap, cap);
                                self.tau = self.tuning.overscroll_tau_ms;
                                // Keep advancing through the excursion.
                            } else {
                                self.phase = Phase::Idle;
                                self.t0 = cross;
                                self.p0 = target_edge;
                                self.v0 = 0.0;
                                break;
                            }
                        }
                        _ if stop_at <= t => {
                            self.p0 = self.glide_curve().position(stop_at - self.t0);
                            self.t0 = stop_at;
                            self.v0 = 0.0;
                            self.phase = Phase::Idle;
                            break;
                        }
                        _ => break,
                    }
                }
                Phase::BounceBack => {
                    let spring = self.spring();
                    let dt = t - self.t0;
                    let p = spring.position(dt);
                    let v = spring.velocity(dt);
                    if (p - self.edge).abs() < self.tuning.settle_epsilon_dp
                        && v.abs() < self.tuning.min_velocity
                    {
                        self.phase = Phase::Idle;
                        self.p0 = self.edge;
                        self.v0 = 0.0;
                        self.t0 = t;
                    }
                    break;
                }
            }
        }
    }

    fn apply(&mut self, t: Millis, event: LogEvent, bounds: &AxisBounds) {
        match event {
            LogEvent::Delta { dp, rubber } => self.apply_delta(t, dp, rubber, bounds),
            LogEvent::Glide(dp) => self.apply_wheel_glide(t, dp, bounds),
            LogEvent::Interrupt => self.apply_interrupt(t, bounds),
            LogEvent::Release { kinetic } => self.apply_release(t, kinetic, bounds),
        }
    }

    /// Halt any autonomous motion and hand control back to the device.
    fn absorb_motion(&mut self, t: Millis, bounds: &AxisBounds) {
        let absorbing = matches!(self.phase, Phase::Kinetic | Phase::BounceBack)
            || (self.phase == Phase::Overscroll && self.glide_overscroll);
        if !absorbing {
            return;
        }
        let p = self.committed_position(t);
        self.p0 = p;
        self.v0 = 0.0;
        self.t0 = t;
        self.glide_overscroll = false;
        self.window.clear();
        self.last_input = t;
        if bounds.contains(p) {
            self.phase = Phase::Tracking;
        } else {
            self.phase = Phase::Overscroll;
            self.edge = bounds.nearest_edge(p);
        }
    }

    fn apply_delta(&mut self, t: Millis, dp: f64, rubber: bool, bounds: &AxisBounds) {
        self.absorb_motion(t, bounds);
        self.armed_release = true;
        self.window.push(t, dp);
        self.last_input = t;

        let p = self.p0;
        let over = bounds.overshoot(p);
        let new_p = if over == 0.0 {
            p + dp
        } else if dp.signum() == over.signum() {
            // Pushing further out meets the rubber band; non-rubber
            // sources cannot push out at all.
            if rubber {
                let r = overscroll_resistance(
                    over,
                    bounds.viewport,
                    self.tuning.overscroll_resistance_k,
                );
                p + dp * r
            } else {
                p
            }
        } else {
            // Pulling back toward the content is never resisted.
            p + dp
        };

        self.settle_tracked(new_p, rubber, bounds);
    }

    /// Place a tracked position, entering or leaving Overscroll as the
    /// bounce flags allow.
    fn settle_tracked(&mut self, new_p: f64, rubber: bool, bounds: &AxisBounds) {
        let over = bounds.overshoot(new_p);
        if over == 0.0 {
            self.p0 = new_p;
            self.phase = Phase::Tracking;
        } else if rubber && bounds.bounces_toward(over) {
            // The band hard-stops one viewport past the edge.
            self.p0 = new_p.clamp(-bounds.viewport, bounds.max + bounds.viewport);
            self.phase = Phase::Overscroll;
            self.glide_overscroll = false;
            self.edge = bounds.nearest_edge(new_p);
        } else {
            self.p0 = bounds.clamp(new_p);
            self.phase = Phase::Tracking;
        }
    }

    fn apply_wheel_glide(&mut self, t: Millis, dp: f64, bounds: &AxisBounds) {
        // Chain consecutive wheel steps: the remaining velocity of the
        // current glide carries into the new one.
        let carry = if self.phase == Phase::Kinetic {
            self.glide_curve().velocity(t - self.t0)
        } else {
            0.0
        };
        let p = bounds.clamp(self.committed_position(t));
        let v = carry + dp / self.tuning.wheel_glide_tau_ms;

        self.armed_release = true;
        self.last_input = t;
        self.window.clear();
        self.glide_overscroll = false;
        self.p0 = p;
        self.t0 = t;

        if v.abs() < self.tuning.min_velocity {
            self.phase = Phase::Idle;
            self.v0 = 0.0;
        } else {
            self.phase = Phase::Kinetic;
            self.v0 = v;
            self.tau = self.tuning.wheel_glide_tau_ms;
            self.rubber_fling = false;
        }
    }

    fn apply_interrupt(&mut self, t: Millis, bounds: &AxisBounds) {
        match self.phase {
            Phase::Idle => {}
            Phase::Tracking => self.window.clear(),
            Phase::Overscroll if !self.glide_overscroll => self.window.clear(),
            _ => self.absorb_motion(t, bounds),
        }
    }

    fn apply_release(&mut self, t: Millis, kinetic_allowed: bool, bounds: &AxisBounds) {
        if !self.armed_release {
            return;
        }
        self.armed_release = false;

        match self.phase {
            Phase::Tracking => {
                let v = self.window.estimate(t);
                self.window.clear();
                if kinetic_allowed && v.abs() >= self.tuning.min_velocity {
                    self.phase = Phase::Kinetic;
                    self.v0 = v.clamp(
                        -self.tuning.max_fling_velocity,
                        self.tuning.max_fling_velocity,
                    );
                    self.t0 = t;
                    self.tau = self.tuning.fling_tau_ms;
                    self.rubber_fling = true;
                } else {
                    self.phase = Phase::Idle;
                    self.v0 = 0.0;
                    self.t0 = t;
                }
            }
            Phase::Overscroll if !self.glide_overscroll => {
                self.window.clear();
                let p = self.p0;
                self.enter_bounce(t, p, bounds);
            }
            // Idle (quiescence already fired), an active wheel glide, or a
            // bounce in flight: nothing to do.
            _ => {}
        }
    }

    fn enter_bounce(&mut self, t: Millis, p: f64, bounds: &AxisBounds) {
        self.phase = Phase::BounceBack;
        self.glide_overscroll = false;
        self.edge = bounds.nearest_edge(p);
        self.t0 = t;
        self.p0 = p;
        self.v0 = 0.0;
    }

    fn sample_position(&self, now: Millis, t: Millis, bounds: &AxisBounds) -> f64 {
        match self.phase {
            Phase::Idle => self.p0,
            Phase::Tracking => {
                // Non-committed overshoot prediction: extrapolate by the
                // lead only, clamped so prediction never enters overscroll.
                let v = self.window.estimate(now);
                bounds.clamp(self.p0 + v * (t - now).max(0.0))
            }
            Phase::Overscroll if !self.glide_overscroll => self.p0,
            Phase::Kinetic | Phase::Overscroll => self.glide_curve().position(t - self.t0),
            Phase::BounceBack => self.spring().position(t - self.t0),
        }
    }

    fn sample_velocity(&self, now: Millis, t: Millis) -> f64 {
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Tracking => self.window.estimate(now),
            Phase::Overscroll if !self.glide_overscroll => self.window.estimate(now),
            Phase::Kinetic | Phase::Overscroll => self.glide_curve().velocity(t - self.t0),
            Phase::BounceBack => self.spring().velocity(t - self.t0),
        }
    }
}

fn sanitize_dp(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-MAX_FORCE_DP, MAX_FORCE_DP)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Millis = 16.0;

    fn bounds() -> AxisBounds {
        AxisBounds {
            max: 1500.0,
            viewport: 500.0,
            bounce_min: true,
            bounce_max: true,
        }
    }

    fn hard_bounds() -> AxisBounds {
        AxisBounds {
            bounce_min: false,
            bounce_max: false,
            ..bounds()
        }
    }

    fn axis() -> AxisState {
        AxisState::new(MotionTuning::default(), 0.0, &bounds())
    }

    fn axis_at(p: f64) -> AxisState {
        AxisState::new(MotionTuning::default(), p, &bounds())
    }

    fn delta(dp: f64) -> LogEvent {
        LogEvent::Delta { dp, rubber: true }
    }

    fn release() -> LogEvent {
        LogEvent::Release { kinetic: true }
    }

    /// Feed a steady 1 dp/ms drag: `n` deltas of 10 dp spaced 10 ms apart,
    /// starting at t = 0.
    fn steady_drag(a: &mut AxisState, n: usize) {
        for i in 0..n {
            a.push(i as f64 * 10.0, delta(10.0));
        }
    }

    // --- Idle / Tracking ---

    #[test]
    fn new_axis_is_idle_at_initial() {
        let a = AxisState::new(MotionTuning::default(), 300.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
    }

    #[test]
    fn initial_position_is_clamped() {
        let mut a = AxisState::new(MotionTuning::default(), 9_000.0, &bounds());
        let s = a.commit(0.0, 0.0, &bounds());
        assert_eq!(s.position, 1500.0);
    }

    #[test]
    fn delta_moves_to_tracking() {
        let mut a = axis();
        a.push(0.0, delta(100.0));
        let (pan, s) = a.take_pan(1.0, 1.0, &bounds());
        assert_eq!(pan, 100);
        assert_eq!(a.phase(), Phase::Tracking);
        assert!(s.had_events);
        assert!(s.active);
    }

    #[test]
    fn single_delta_velocity_spreads_over_elapsed() {
        let mut a = axis();
        a.push(0.0, delta(100.0));
        let s = a.commit(1.0, 1.0, &bounds());
        assert!((s.velocity - 100.0).abs() < 1e-9);
    }

    #[test]
    fn quiescence_drops_to_idle() {
        let mut a = axis();
        a.push(0.0, delta(50.0));
        a.commit(1.0, 1.0, &bounds());
        assert_eq!(a.phase(), Phase::Tracking);

        let s = a.commit(40.0, 40.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 50.0);
        assert_eq!(s.velocity, 0.0);
        assert!(!s.active);
    }

    #[test]
    fn second_pan_with_no_events_is_zero() {
        let mut a = axis();
        a.push(0.0, delta(50.0));
        let (first, _) = a.take_pan(1.0, 1.0, &bounds());
        let (second, s) = a.take_pan(1.0, 1.0, &bounds());
        assert_eq!(first, 50);
        assert_eq!(second, 0);
        assert!(!s.had_events);
    }

    #[test]
    fn tracking_extrapolates_by_prediction_lead() {
        let mut a = axis();
        steady_drag(&mut a, 10); // 1 dp/ms up to t = 90
        let s_now = a.commit(95.0, 95.0, &bounds());
        let mut b = axis();
        steady_drag(&mut b, 10);
        let s_lead = b.commit(95.0, 103.0, &bounds());
        assert!(
            s_lead.position > s_now.position,
            "prediction lead should land ahead: {} vs {}",
            s_lead.position,
            s_now.position
        );
    }

    #[test]
    fn tracking_prediction_never_overscrolls() {
        let mut a = axis_at(1480.0);
        a.push(0.0, delta(15.0));
        let s = a.commit(1.0, 40.0, &bounds());
        assert!(s.position <= 1500.0);
    }

    // --- Kinetic ---

    fn flung(n: usize, release_at: Millis) -> AxisState {
        let mut a = axis();
        steady_drag(&mut a, n);
        a.push(release_at, release());
        a
    }

    #[test]
    fn release_starts_kinetic_with_windowed_velocity() {
        let mut a = flung(10, 100.0);
        let s = a.commit(100.0, 100.0, &bounds());
        assert_eq!(a.phase(), Phase::Kinetic);
        assert!((s.velocity - 1.0).abs() < 0.05, "velocity {}", s.velocity);
    }

    #[test]
    fn kinetic_position_follows_friction_curve() {
        let mut a = flung(10, 100.0);
        let s = a.commit(500.0, 500.0, &bounds());
        // p = 100 + 325·(1 − e^(−400/325))
        let expected = 100.0 + 325.0 * (1.0 - (-400.0_f64 / 325.0).exp());
        assert!((s.position - expected).abs() < 1.0, "{}", s.position);
        assert!(s.position > 100.0 && s.position < 425.0);
    }

    #[test]
    fn kinetic_velocity_decays_monotonically() {
        let mut a = flung(10, 100.0);
        let mut prev = f64::INFINITY;
        for i in 0..60 {
            let s = a.commit(100.0 + f64::from(i) * FRAME, 100.0 + f64::from(i) * FRAME, &bounds());
            assert!(s.velocity.abs() <= prev + 1e-12);
            prev = s.velocity.abs();
        }
    }

    #[test]
    fn kinetic_settles_to_idle_at_velocity_floor() {
        let mut a = flung(10, 100.0);
        let s = a.commit(3_000.0, 3_000.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert!((s.position - 425.0).abs() < 7.0, "{}", s.position);
        assert_eq!(s.velocity, 0.0);
        assert!(!s.active);
    }

    #[test]
    fn kinetic_interrupt_halts_motion() {
        let mut a = flung(10, 100.0);
        a.commit(150.0, 150.0, &bounds());
        a.push(200.0, LogEvent::Interrupt);
        let s = a.commit(201.0, 201.0, &bounds());
        assert_eq!(s.velocity, 0.0);
        let p = s.position;
        // Position holds after the halt (quiescence then idles it).
        let s = a.commit(400.0, 400.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, p);
    }

    #[test]
    fn kinetic_absorbs_new_delta_into_tracking() {
        let mut a = flung(10, 100.0);
        a.commit(150.0, 150.0, &bounds());
        a.push(200.0, delta(-5.0));
        a.commit(201.0, 201.0, &bounds());
        assert_eq!(a.phase(), Phase::Tracking);
    }

    #[test]
    fn release_without_delta_is_noop() {
        let mut a = axis();
        a.push(0.0, delta(10.0));
        a.push(5.0, LogEvent::Release { kinetic: false });
        a.commit(6.0, 6.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        // Second release with no delta in between: nothing restarts.
        a.push(20.0, release());
        let s = a.commit(21.0, 21.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 10.0);
    }

    #[test]
    fn slow_release_goes_idle_not_kinetic() {
        let mut a = axis();
        // 1 dp per 20 ms = 0.05 dp/ms... still above floor; use far slower.
        a.push(0.0, delta(0.1));
        a.push(20.0, delta(0.1));
        a.push(40.0, release());
        a.commit(41.0, 41.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
    }

    #[test]
    fn release_with_kinetic_disallowed_goes_idle() {
        let mut a = axis();
        steady_drag(&mut a, 10);
        a.push(100.0, LogEvent::Release { kinetic: false });
        let s = a.commit(101.0, 101.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.velocity, 0.0);
        assert_eq!(s.position, 100.0);
    }

    #[test]
    fn fling_velocity_is_capped() {
        let mut a = axis();
        // 100 dp every 10 ms = 10 dp/ms, over the 6 dp/ms cap.
        for i in 0..10 {
            a.push(f64::from(i) * 10.0, delta(100.0));
        }
        a.push(100.0, release());
        a.commit(100.0, 100.0, &bounds());
        let s = a.commit(116.0, 116.0, &bounds());
        assert!(s.velocity.abs() <= 6.0);
    }

    // --- Edges, overscroll, bounce ---

    #[test]
    fn hard_edge_clamps_tracked_delta() {
        let mut a = AxisState::new(MotionTuning::default(), 1480.0, &hard_bounds());
        a.push(0.0, delta(100.0));
        let s = a.commit(1.0, 1.0, &hard_bounds());
        assert_eq!(s.position, 1500.0);
        assert_eq!(a.phase(), Phase::Tracking);
    }

    #[test]
    fn bouncing_edge_admits_overscroll() {
        let mut a = axis_at(1480.0);
        a.push(0.0, delta(100.0));
        let s = a.commit(1.0, 1.0, &bounds());
        assert!(s.position > 1500.0);
        assert_eq!(a.phase(), Phase::Overscroll);
    }

    #[test]
    fn overscroll_resists_further_outward_drag() {
        let mut a = axis_at(1500.0);
        a.push(0.0, delta(100.0));
        a.commit(1.0, 1.0, &bounds());
        let s1 = a.commit(1.0, 1.0, &bounds());
        let over1 = s1.position - 1500.0;

        a.push(10.0, delta(100.0));
        let s2 = a.commit(11.0, 11.0, &bounds());
        let step2 = s2.position - s1.position;
        assert!(
            step2 < over1,
            "second outward step {step2} should be resisted below first {over1}"
        );
    }

    #[test]
    fn overscroll_inward_drag_is_unresisted() {
        let mut a = axis_at(1500.0);
        a.push(0.0, delta(100.0));
        a.commit(1.0, 1.0, &bounds());
        a.push(10.0, delta(-60.0));
        let s = a.commit(11.0, 11.0, &bounds());
        assert!((s.position - 1540.0).abs() < 1e-9);
        a.push(20.0, delta(-60.0));
        let s = a.commit(21.0, 21.0, &bounds());
        assert!(s.position < 1500.0 + 1e-9);
        assert_eq!(a.phase(), Phase::Tracking);
    }

    #[test]
    fn overscroll_release_bounces_back_to_edge() {
        let mut a = axis_at(1500.0);
        a.push(0.0, delta(100.0));
        a.push(10.0, release());
        a.commit(11.0, 11.0, &bounds());
        assert_eq!(a.phase(), Phase::BounceBack);

        // Monotone approach to the edge.
        let mut prev = f64::INFINITY;
        for i in 1..60 {
            let s = a.commit(10.0 + f64::from(i) * FRAME, 10.0 + f64::from(i) * FRAME, &bounds());
            let d = (s.position - 1500.0).abs();
            assert!(d <= prev + 1e-9);
            prev = d;
        }

        let s = a.commit(2_000.0, 2_000.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 1500.0);
    }

    #[test]
    fn kinetic_into_hard_edge_clamps_idle() {
        let mut a = AxisState::new(MotionTuning::default(), 1400.0, &hard_bounds());
        for i in 0..10 {
            a.push(f64::from(i) * 10.0, delta(5.0));
        }
        a.push(100.0, release());
        let s = a.commit(2_000.0, 2_000.0, &hard_bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 1500.0);
    }

    #[test]
    fn kinetic_into_bouncing_edge_overshoots_and_returns() {
        let mut a = axis_at(1400.0);
        for i in 0..10 {
            a.push(f64::from(i) * 10.0, delta(5.0));
        }
        a.push(100.0, release());
        a.commit(100.0, 100.0, &bounds());
        assert_eq!(a.phase(), Phase::Kinetic);

        // Track the excursion: it must leave the range, peak, and settle
        // back exactly at the edge.
        let mut peak = 0.0_f64;
        let mut t = 100.0;
        loop {
            t += FRAME;
            let s = a.commit(t, t, &bounds());
            peak = peak.max(s.position - 1500.0);
            if a.phase() == Phase::Idle {
                assert_eq!(s.position, 1500.0);
                break;
            }
            assert!(t < 5_000.0, "bounce failed to settle");
        }
        assert!(peak > 0.0, "kinetic should have carried past the edge");
    }

    #[test]
    fn glide_overscroll_absorbs_interrupt() {
        // Drag ends exactly at the edge; the release fling carries past it.
        let mut a = axis_at(1400.0);
        steady_drag(&mut a, 10);
        a.push(100.0, release());
        // Let the kinetic carry past the edge, then interrupt mid-excursion.
        a.commit(120.0, 120.0, &bounds());
        assert_eq!(a.phase(), Phase::Overscroll);
        a.push(130.0, LogEvent::Interrupt);
        a.commit(131.0, 131.0, &bounds());
        assert_eq!(a.phase(), Phase::Overscroll);
        let s = a.commit(200.0, 200.0, &bounds());
        // Held overscroll: no autonomous motion without a release.
        let s2 = a.commit(300.0, 300.0, &bounds());
        assert_eq!(s.position, s2.position);
    }

    // --- Wheel glide ---

    #[test]
    fn wheel_glide_travels_step_within_a_dp() {
        let mut a = axis();
        a.push(0.0, LogEvent::Glide(120.0));
        let s = a.commit(250.0, 250.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert!((s.position - 120.0).abs() < 1.0, "{}", s.position);
    }

    #[test]
    fn wheel_glide_frame_deltas_decrease() {
        let mut a = axis();
        a.push(0.0, LogEvent::Glide(120.0));
        let mut last_pan = i64::MAX;
        let mut total = 0;
        for i in 1..14 {
            let t = f64::from(i) * FRAME;
            let (pan, _) = a.take_pan(t, t, &bounds());
            assert!(pan <= last_pan, "per-frame deltas should shrink");
            last_pan = pan;
            total += pan;
        }
        assert!((119..=121).contains(&total), "total {total}");
    }

    #[test]
    fn wheel_glide_steps_chain() {
        let mut a = axis();
        a.push(0.0, LogEvent::Glide(120.0));
        a.push(50.0, LogEvent::Glide(120.0));
        let s = a.commit(500.0, 500.0, &bounds());
        // Both steps complete (the second inherits the first's remainder).
        assert!((s.position - 240.0).abs() < 2.0, "{}", s.position);
    }

    #[test]
    fn wheel_glide_never_rubber_bands() {
        let mut a = axis_at(1450.0);
        a.push(0.0, LogEvent::Glide(120.0));
        let mut peak = 0.0_f64;
        for i in 1..20 {
            let s = a.commit(f64::from(i) * FRAME, f64::from(i) * FRAME, &bounds());
            peak = peak.max(s.position);
        }
        assert!(peak <= 1500.0);
        assert_eq!(a.phase(), Phase::Idle);
    }

    #[test]
    fn opposing_wheel_glides_cancel() {
        let mut a = axis_at(500.0);
        a.push(0.0, LogEvent::Glide(120.0));
        a.push(10.0, LogEvent::Glide(-120.0));
        let s = a.commit(500.0, 500.0, &bounds());
        // Net travel well short of a full step in either direction.
        assert!((s.position - 500.0).abs() < 60.0, "{}", s.position);
        assert_eq!(a.phase(), Phase::Idle);
    }

    // --- Forced repositions ---

    #[test]
    fn force_to_in_range_is_idle() {
        let mut a = axis();
        a.commit(10.0, 10.0, &bounds());
        a.force_to(10.0, 700.0, &bounds());
        let s = a.commit(10.0, 10.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 700.0);
    }

    #[test]
    fn force_to_past_bouncing_edge_springs_back() {
        let mut a = axis();
        a.force_to(0.0, 9_999.0, &bounds());
        assert_eq!(a.phase(), Phase::BounceBack);

        let mut prev = f64::INFINITY;
        let mut t = 0.0;
        loop {
            t += FRAME;
            let s = a.commit(t, t, &bounds());
            let d = (s.position - 1500.0).abs();
            assert!(d <= prev + 1e-9, "approach must be monotone");
            prev = d;
            if a.phase() == Phase::Idle {
                assert_eq!(s.position, 1500.0);
                break;
            }
            assert!(t < 10_000.0, "failed to settle");
        }
    }

    #[test]
    fn force_to_past_hard_edge_clamps() {
        let mut a = AxisState::new(MotionTuning::default(), 0.0, &hard_bounds());
        a.force_to(0.0, -250.0, &hard_bounds());
        let s = a.commit(1.0, 1.0, &hard_bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 0.0);
    }

    #[test]
    fn force_jump_cancels_active_bounce() {
        let mut a = axis_at(1500.0);
        a.push(0.0, delta(100.0));
        a.push(10.0, release());
        a.commit(20.0, 20.0, &bounds());
        assert_eq!(a.phase(), Phase::BounceBack);
        a.force_to(20.0, 400.0, &bounds());
        let s = a.commit(21.0, 21.0, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(s.position, 400.0);
    }

    #[test]
    fn force_by_is_relative() {
        let mut a = axis_at(200.0);
        a.commit(5.0, 5.0, &bounds());
        a.force_by(5.0, -50.0, &bounds());
        let s = a.commit(6.0, 6.0, &bounds());
        assert_eq!(s.position, 150.0);
    }

    #[test]
    fn force_nan_is_saturated() {
        let mut a = axis_at(200.0);
        a.force_to(0.0, f64::NAN, &bounds());
        let s = a.commit(1.0, 1.0, &bounds());
        assert_eq!(s.position, 0.0);
    }

    // --- Accumulator law ---

    #[test]
    fn summed_pans_equal_position_change() {
        let mut a = axis();
        let mut sum = 0;
        steady_drag(&mut a, 10);
        a.push(100.0, release());
        let mut t = 0.0;
        for _ in 0..300 {
            t += FRAME;
            let (pan, _) = a.take_pan(t, t, &bounds());
            sum += pan;
        }
        let s = a.commit(t, t, &bounds());
        assert_eq!(a.phase(), Phase::Idle);
        assert_eq!(sum, s.position.round() as i64);
    }

    #[test]
    fn pan_includes_forced_jumps() {
        let mut a = axis();
        a.commit(1.0, 1.0, &bounds());
        a.force_to(1.0, 800.0, &bounds());
        let (pan, _) = a.take_pan(2.0, 2.0, &bounds());
        assert_eq!(pan, 800);
    }

    // --- Clock discipline ---

    #[test]
    fn sample_time_never_regresses() {
        let mut a = flung(10, 100.0);
        let s1 = a.commit(200.0, 260.0, &bounds());
        // A later query with an earlier target clamps to the committed clock.
        let s2 = a.commit(210.0, 210.0, &bounds());
        assert!(s2.position >= s1.position - 1e-9);
    }

    #[test]
    fn event_older_than_committed_clock_applies_at_clock() {
        let mut a = axis();
        a.commit(100.0, 160.0, &bounds());
        a.push(120.0, delta(10.0)); // arrives "before" the committed clock
        let s = a.commit(161.0, 161.0, &bounds());
        assert_eq!(s.position, 10.0);
    }

    #[test]
    fn geometry_reclamp_leaves_bounce_alone() {
        let mut a = axis_at(1500.0);
        a.push(0.0, delta(100.0));
        a.push(10.0, release());
        a.commit(20.0, 20.0, &bounds());
        assert_eq!(a.phase(), Phase::BounceBack);
        a.reclamp(20.0, &bounds());
        assert_eq!(a.phase(), Phase::BounceBack);
    }

    #[test]
    fn geometry_reclamp_pulls_idle_into_range() {
        let mut a = axis_at(1200.0);
        let shrunk = AxisBounds {
            max: 700.0,
            ..bounds()
        };
        a.reclamp(0.0, &shrunk);
        let s = a.commit(1.0, 1.0, &shrunk);
        assert_eq!(s.position, 700.0);
    }
}
