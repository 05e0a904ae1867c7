#![forbid(unsafe_code)]

//! Deterministic scripted driver for exercising the pan interpreter end to
//! end.
//!
//! Production hosts feed events from a real input stack and sample once per
//! display frame. Tests need the same shape without the nondeterminism, so
//! [`Drive`] replays a [`Script`] of timestamped actions against a
//! [`Scrollview`] while sampling at a fixed frame cadence, recording one
//! [`FrameRecord`] per frame. Assertions then run over the whole recorded
//! timeline instead of a single end state.
//!
//! Everything is driven by explicit milliseconds; replaying the same script
//! twice yields byte-identical records.

use fling_core::classify::InputSource;
use fling_core::clock::Millis;
use fling_core::geometry::Geometry;
use fling_core::scrollview::{Options, PanTransform, Scrollview};
use fling_core::Phase;

/// One scripted host action.
#[derive(Debug, Clone)]
pub enum Action {
    /// Two-axis device delta.
    Scroll(f64, f64),
    /// x-axis device delta.
    ScrollX(f64),
    /// y-axis device delta.
    ScrollY(f64),
    /// User re-engaged the device.
    Interrupt,
    /// Gesture ended.
    Release,
    /// Synchronous relative reposition.
    ForcePan(f64, f64),
    /// Synchronous absolute reposition.
    ForceJump(f64, f64),
    /// Switch the input source.
    SetSource(InputSource),
    /// Replace the options bitset.
    SetOptions(Options),
    /// Store a frame latency estimate.
    SetPredict(f64, f64),
    /// Replace the geometry.
    SetGeometry(Geometry),
}

/// A timeline of `(time, action)` pairs. Actions at equal times apply in
/// insertion order, before that instant's frame sample.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<(Millis, Action)>,
}

impl Script {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action at time `at` (builder pattern).
    #[must_use]
    pub fn at(mut self, at: Millis, action: Action) -> Self {
        self.steps.push((at, action));
        self
    }

    /// Append a steady drag: `n` deltas of `(dx, dy)` spaced `spacing` ms,
    /// starting at `start`.
    #[must_use]
    pub fn drag(mut self, start: Millis, spacing: Millis, n: usize, dx: f64, dy: f64) -> Self {
        for i in 0..n {
            self.steps.push((start + i as f64 * spacing, Action::Scroll(dx, dy)));
        }
        self
    }

    fn sorted(&self) -> Vec<(Millis, Action)> {
        let mut steps = self.steps.clone();
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        steps
    }
}

/// What one sampled frame looked like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecord {
    /// Sample time.
    pub at: Millis,
    /// The committing pan read.
    pub pan: PanTransform,
    /// Absolute viewport origin after the read.
    pub pos: (i64, i64),
    /// Axis phases after the read.
    pub phase: (Phase, Phase),
}

/// Replays a [`Script`] against a scrollview at a fixed frame cadence.
#[derive(Debug)]
pub struct Drive {
    view: Scrollview,
    frame_interval: Millis,
}

impl Drive {
    /// Drive the given scrollview at 60 Hz (16 ms frames).
    #[must_use]
    pub fn new(view: Scrollview) -> Self {
        Self::with_frame_interval(view, 16.0)
    }

    /// Drive at a custom frame interval.
    #[must_use]
    pub fn with_frame_interval(view: Scrollview, frame_interval: Millis) -> Self {
        Self {
            view,
            frame_interval: frame_interval.max(1.0),
        }
    }

    /// Access the scrollview between runs.
    #[must_use]
    pub fn view_mut(&mut self) -> &mut Scrollview {
        &mut self.view
    }

    /// Replay `script`, sampling every frame until `until` (inclusive of
    /// the final frame). Returns one record per frame.
    pub fn run(&mut self, script: &Script, until: Millis) -> Vec<FrameRecord> {
        let steps = script.sorted();
        let mut next_step = 0;
        let mut records = Vec::new();
        let mut t = 0.0;

        while t <= until {
            t += self.frame_interval;
            // Apply every action scheduled before or at this frame.
            while next_step < steps.len() && steps[next_step].0 <= t {
                let (at, action) = &steps[next_step];
                self.apply(action, *at);
                next_step += 1;
            }
            let pan = self.view.get_pan(t);
            let pos = (self.view.get_pos_x(t), self.view.get_pos_y(t));
            let phase = (self.view.phase_x(), self.view.phase_y());
            records.push(FrameRecord { at: t, pan, pos, phase });
        }
        records
    }

    fn apply(&mut self, action: &Action, at: Millis) {
        match action {
            Action::Scroll(dx, dy) => self.view.add_scroll(*dx, *dy, at),
            Action::ScrollX(dx) => self.view.add_scroll_x(*dx, at),
            Action::ScrollY(dy) => self.view.add_scroll_y(*dy, at),
            Action::Interrupt => self.view.add_scroll_interrupt(at),
            Action::Release => self.view.add_scroll_release(at),
            Action::ForcePan(dx, dy) => self.view.force_pan(*dx, *dy, at),
            Action::ForceJump(x, y) => self.view.force_jump(*x, *y, at),
            Action::SetSource(source) => self.view.set_input_source(*source),
            Action::SetOptions(options) => self.view.set_options(*options),
            Action::SetPredict(vsync, frametime) => self.view.set_predict(*vsync, *frametime),
            Action::SetGeometry(geometry) => {
                self.view
                    .set_geometry(*geometry, at)
                    .expect("scripted geometry must be valid");
            }
        }
    }
}

/// Sum of the y pan deltas across a run.
#[must_use]
pub fn total_pan_y(records: &[FrameRecord]) -> i64 {
    records.iter().map(|r| r.pan.y).sum()
}

/// Sum of the x pan deltas across a run.
#[must_use]
pub fn total_pan_x(records: &[FrameRecord]) -> i64 {
    records.iter().map(|r| r.pan.x).sum()
}

/// The record at which both axes first went (and stayed) idle, if any.
#[must_use]
pub fn settled_at(records: &[FrameRecord]) -> Option<&FrameRecord> {
    let last_active = records
        .iter()
        .rposition(|r| r.pan.panned || r.phase != (Phase::Idle, Phase::Idle));
    match last_active {
        None => records.first(),
        Some(i) => records.get(i + 1),
    }
}
