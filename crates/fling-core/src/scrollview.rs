#![forbid(unsafe_code)]

//! Scrollview aggregator: two axis machines behind one query surface.
//!
//! A [`Scrollview`] owns the geometry, the input classification settings,
//! the stored frame prediction, and one [`AxisState`] per axis. The host
//! pushes device events as they arrive and, once per frame, asks for a
//! [`PanTransform`] telling it where to place the viewport.
//!
//! All methods take `now` explicitly (fractional milliseconds on the
//! host's monotonic axis); the [`registry`](crate::registry) stamps it from
//! a real clock for hosts that don't want to. Time only advances inside
//! calls; the library performs no background work.
//!
//! # Usage
//!
//! ```
//! use fling_core::geometry::{BounceEdges, Geometry};
//! use fling_core::scrollview::Scrollview;
//!
//! let geometry = Geometry::new(1000.0, 2000.0, 500.0, 500.0)
//!     .with_bounce(BounceEdges::all());
//! let mut view = Scrollview::new(geometry).unwrap();
//!
//! view.add_scroll(0.0, 100.0, 0.0);
//! let pan = view.get_pan(1.0);
//! assert_eq!((pan.x, pan.y), (0, 100));
//! assert!(pan.panned);
//! ```

use bitflags::bitflags;

use crate::axis::{AxisSample, AxisState, MotionTuning, Phase};
use crate::classify::{Classifier, ClassifierTuning, InputSource};
use crate::clock::{FrameTiming, Millis};
use crate::error::GeometryError;
use crate::geometry::{AxisId, Geometry};
use crate::log::LogEvent;
use crate::velocity::VelocityWindow;

bitflags! {
    /// Behavior toggles, or-able and forward-compatible: unknown bits are
    /// ignored on the way in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u32 {
        /// Animate coarse wheel steps as short glides instead of jumps.
        const IMPRECISE_SCROLLS_SMOOTHLY = 0x1;
    }
}

/// One frame's viewport instruction.
///
/// `x`/`y` are the unread pan deltas in integer dp; `panned == false` is a
/// strong signal: nothing moved, nothing is queued, and no further motion
/// will occur without new input, so the render loop may block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanTransform {
    /// Unread x pan in dp.
    pub x: i64,
    /// Unread y pan in dp.
    pub y: i64,
    /// Whether anything moved or is still in motion.
    pub panned: bool,
    /// Current x velocity in dp/ms.
    pub velocity_x: f64,
    /// Current y velocity in dp/ms.
    pub velocity_y: f64,
}

/// A scrollable content area viewed through a smaller viewport.
#[derive(Debug, Clone)]
pub struct Scrollview {
    geometry: Geometry,
    /// Geometry has been supplied; queries before that return inert
    /// transforms rather than errors.
    ready: bool,
    options: Options,
    source: InputSource,
    scale: (f64, f64),
    classifier: Classifier,
    predict: FrameTiming,
    motion: MotionTuning,
    x: AxisState,
    y: AxisState,
    /// Arrival-side gesture speed trackers feeding the touchpad gain.
    /// Separate from the axis windows, which update lazily at drain time.
    accel_x: VelocityWindow,
    accel_y: VelocityWindow,
}

impl Scrollview {
    /// Create a scrollview with the given geometry.
    ///
    /// The initial viewport origin is the geometry's initial offsets,
    /// clamped into the legal range.
    pub fn new(geometry: Geometry) -> Result<Self, GeometryError> {
        Self::with_tuning(geometry, MotionTuning::default())
    }

    /// Create a scrollview with explicit motion tuning.
    pub fn with_tuning(geometry: Geometry, motion: MotionTuning) -> Result<Self, GeometryError> {
        geometry.validate()?;
        let x = AxisState::new(
            motion.clone(),
            geometry.initial(AxisId::Horizontal),
            &geometry.axis_bounds(AxisId::Horizontal),
        );
        let y = AxisState::new(
            motion.clone(),
            geometry.initial(AxisId::Vertical),
            &geometry.axis_bounds(AxisId::Vertical),
        );
        let accel = VelocityWindow::new(motion.velocity_window_len, motion.velocity_window_ms);
        Ok(Self {
            geometry,
            ready: true,
            options: Options::empty(),
            source: InputSource::default(),
            scale: (1.0, 1.0),
            classifier: Classifier::default(),
            predict: FrameTiming::default(),
            motion,
            x,
            y,
            accel_x: accel.clone(),
            accel_y: accel,
        })
    }

    /// Create a scrollview with no geometry yet (zero extents).
    ///
    /// Until [`Scrollview::set_geometry`] is called, queries return inert
    /// transforms with `panned == false`.
    #[must_use]
    pub fn unconfigured() -> Self {
        let mut view = Self::with_tuning(Geometry::default(), MotionTuning::default())
            .expect("zero geometry is valid");
        view.ready = false;
        view
    }

    // -- configuration ------------------------------------------------------

    /// Current geometry.
    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Whether geometry has been supplied.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Replace the geometry at time `now`.
    ///
    /// On the first call this also applies the geometry's initial offsets;
    /// afterwards positions are re-clamped into the new legal range unless
    /// an overscroll excursion or bounce is in flight.
    pub fn set_geometry(&mut self, geometry: Geometry, now: Millis) -> Result<(), GeometryError> {
        geometry.validate()?;
        let first = !self.ready;
        self.geometry = geometry;
        self.ready = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            content = ?(geometry.content_width, geometry.content_height),
            viewport = ?(geometry.viewport_width, geometry.viewport_height),
            first,
            "geometry updated"
        );

        let bx = self.geometry.axis_bounds(AxisId::Horizontal);
        let by = self.geometry.axis_bounds(AxisId::Vertical);
        if first {
            self.x = AxisState::new(
                self.motion.clone(),
                self.geometry.initial(AxisId::Horizontal),
                &bx,
            );
            self.y = AxisState::new(
                self.motion.clone(),
                self.geometry.initial(AxisId::Vertical),
                &by,
            );
        } else {
            self.x.reclamp(now, &bx);
            self.y.reclamp(now, &by);
        }
        Ok(())
    }

    /// Declare where subsequent deltas come from. Applies prospectively:
    /// already-queued deltas keep their prior classification.
    pub fn set_input_source(&mut self, source: InputSource) {
        self.source = source;
    }

    /// Current input source.
    #[inline]
    #[must_use]
    pub fn input_source(&self) -> InputSource {
        self.source
    }

    /// Normalization factors for quirky devices. Non-finite or
    /// non-positive factors saturate to 1.
    pub fn set_scale_factor(&mut self, fx: f64, fy: f64) {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        self.scale = (sanitize(fx), sanitize(fy));
    }

    /// Replace the options bitset. Reserved bits are ignored.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Current options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Replace the motion tuning on both axes.
    pub fn set_motion_tuning(&mut self, motion: MotionTuning) {
        self.x.set_tuning(motion.clone());
        self.y.set_tuning(motion.clone());
        let accel = VelocityWindow::new(motion.velocity_window_len, motion.velocity_window_ms);
        self.accel_x = accel.clone();
        self.accel_y = accel;
        self.motion = motion;
    }

    /// Replace the classifier tuning.
    pub fn set_classifier_tuning(&mut self, tuning: ClassifierTuning) {
        self.classifier.set_tuning(tuning);
    }

    /// Store the frame latency estimate consumed by subsequent
    /// [`Scrollview::get_pan`] calls.
    pub fn set_predict(&mut self, ms_to_vsync: f64, ms_avg_frametime: f64) {
        self.predict = FrameTiming::new(ms_to_vsync, ms_avg_frametime);
    }

    // -- event ingestion ----------------------------------------------------

    /// Queue a two-axis device delta observed at `now`.
    pub fn add_scroll(&mut self, dx: f64, dy: f64, now: Millis) {
        self.add_scroll_x(dx, now);
        self.add_scroll_y(dy, now);
    }

    /// Queue an x-axis device delta observed at `now`.
    pub fn add_scroll_x(&mut self, dx: f64, now: Millis) {
        let speed = self.accel_x.estimate(now);
        if let Some(event) = self.classify(dx, self.scale.0, speed, now) {
            self.x.push(now, event);
        }
        if dx.is_finite() {
            self.accel_x.push(now, dx * self.scale.0);
        }
    }

    /// Queue a y-axis device delta observed at `now`.
    pub fn add_scroll_y(&mut self, dy: f64, now: Millis) {
        let speed = self.accel_y.estimate(now);
        if let Some(event) = self.classify(dy, self.scale.1, speed, now) {
            self.y.push(now, event);
        }
        if dy.is_finite() {
            self.accel_y.push(now, dy * self.scale.1);
        }
    }

    fn classify(&self, raw: f64, scale: f64, speed: f64, _now: Millis) -> Option<LogEvent> {
        let smooth = self.options.contains(Options::IMPRECISE_SCROLLS_SMOOTHLY);
        let c = self.classifier.classify(raw, self.source, scale, speed, smooth)?;
        Some(if c.glide {
            LogEvent::Glide(c.delta)
        } else {
            LogEvent::Delta {
                dp: c.delta,
                rubber: c.rubber,
            }
        })
    }

    /// Signal that the user re-engaged the device: halt kinetic motion on
    /// both axes.
    pub fn add_scroll_interrupt(&mut self, now: Millis) {
        self.x.push(now, LogEvent::Interrupt);
        self.y.push(now, LogEvent::Interrupt);
    }

    /// Signal the end of a gesture (the last event of a flick).
    pub fn add_scroll_release(&mut self, now: Millis) {
        let kinetic = self.source.kinetic_on_release();
        self.x.push(now, LogEvent::Release { kinetic });
        self.y.push(now, LogEvent::Release { kinetic });
    }

    // -- forced repositions -------------------------------------------------

    /// Synchronously pan by `(dx, dy)` dp, e.g. a page-down shortcut.
    pub fn force_pan(&mut self, dx: f64, dy: f64, now: Millis) {
        let bx = self.geometry.axis_bounds(AxisId::Horizontal);
        let by = self.geometry.axis_bounds(AxisId::Vertical);
        self.x.commit(now, now, &bx);
        self.y.commit(now, now, &by);
        self.x.force_by(now, dx, &bx);
        self.y.force_by(now, dy, &by);
    }

    /// Synchronously jump to `(x, y)` dp, e.g. jump-to-line.
    pub fn force_jump(&mut self, x: f64, y: f64, now: Millis) {
        let bx = self.geometry.axis_bounds(AxisId::Horizontal);
        let by = self.geometry.axis_bounds(AxisId::Vertical);
        self.x.commit(now, now, &bx);
        self.y.commit(now, now, &by);
        self.x.force_to(now, x, &bx);
        self.y.force_to(now, y, &by);
    }

    // -- queries ------------------------------------------------------------

    /// Consume queued events and return the unread pan for both axes,
    /// sampled at the stored prediction target.
    pub fn get_pan(&mut self, now: Millis) -> PanTransform {
        if !self.ready {
            return PanTransform::default();
        }
        let t_target = self.predict.target(now);
        let bx = self.geometry.axis_bounds(AxisId::Horizontal);
        let by = self.geometry.axis_bounds(AxisId::Vertical);
        let (dx, sx) = self.x.take_pan(now, t_target, &bx);
        let (dy, sy) = self.y.take_pan(now, t_target, &by);

        let panned =
            sx.had_events || sy.had_events || sx.active || sy.active || dx != 0 || dy != 0;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            x = dx,
            y = dy,
            panned,
            phase_x = ?self.x.phase(),
            phase_y = ?self.y.phase(),
            "pan sampled"
        );

        PanTransform {
            x: dx,
            y: dy,
            panned,
            velocity_x: sx.velocity,
            velocity_y: sy.velocity,
        }
    }

    /// Shorthand for [`Scrollview::set_predict`] followed by
    /// [`Scrollview::get_pan`]; use when frame timings are volatile.
    pub fn get_pan_predict(
        &mut self,
        ms_to_vsync: f64,
        ms_avg_frametime: f64,
        now: Millis,
    ) -> PanTransform {
        self.set_predict(ms_to_vsync, ms_avg_frametime);
        self.get_pan(now)
    }

    /// Unread x pan in dp. Consumes the x accumulator only.
    pub fn get_pan_x(&mut self, now: Millis) -> i64 {
        if !self.ready {
            return 0;
        }
        let t_target = self.predict.target(now);
        let bounds = self.geometry.axis_bounds(AxisId::Horizontal);
        self.x.take_pan(now, t_target, &bounds).0
    }

    /// Unread y pan in dp. Consumes the y accumulator only.
    pub fn get_pan_y(&mut self, now: Millis) -> i64 {
        if !self.ready {
            return 0;
        }
        let t_target = self.predict.target(now);
        let bounds = self.geometry.axis_bounds(AxisId::Vertical);
        self.y.take_pan(now, t_target, &bounds).0
    }

    /// Absolute x of the viewport origin in content dp. Does not consume
    /// the pan accumulator.
    pub fn get_pos_x(&mut self, now: Millis) -> i64 {
        self.sample_axis(AxisId::Horizontal, now).position.round() as i64
    }

    /// Absolute y of the viewport origin in content dp. Does not consume
    /// the pan accumulator.
    pub fn get_pos_y(&mut self, now: Millis) -> i64 {
        self.sample_axis(AxisId::Vertical, now).position.round() as i64
    }

    fn sample_axis(&mut self, axis: AxisId, now: Millis) -> AxisSample {
        let t_target = self.predict.target(now);
        let bounds = self.geometry.axis_bounds(axis);
        match axis {
            AxisId::Horizontal => self.x.commit(now, t_target, &bounds),
            AxisId::Vertical => self.y.commit(now, t_target, &bounds),
        }
    }

    /// Current x-axis phase.
    #[inline]
    #[must_use]
    pub fn phase_x(&self) -> Phase {
        self.x.phase()
    }

    /// Current y-axis phase.
    #[inline]
    #[must_use]
    pub fn phase_y(&self) -> Phase {
        self.y.phase()
    }

    /// True while an animation is in flight or events are queued: the host
    /// should keep polling even without new input.
    #[must_use]
    pub fn animating(&self) -> bool {
        self.ready
            && (self.x.phase() != Phase::Idle
                || self.y.phase() != Phase::Idle
                || self.x.pending_events()
                || self.y.pending_events())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
