#![forbid(unsafe_code)]

//! Pointer-input interpretation for scrollable viewports.
//!
//! # Role
//! `fling-core` sits between a host's raw input events and its render
//! loop. The host pushes device deltas as they arrive (touchscreen,
//! touchpad, wheel, or passthrough) and asks once per frame where to place
//! the viewport; the crate answers with a predicted pan transform that
//! already accounts for kinetic coasting, rubber-band overscroll,
//! bounce-back, and the host's frame latency.
//!
//! # Primary responsibilities
//! - **Classification** ([`classify`]): normalize raw deltas per device.
//!   Acceleration for touchpads, step snapping (or smooth glides) for
//!   coarse wheels, identity for touchscreens and driver-curved inputs.
//! - **Axis state machine** ([`axis`]): Idle → Tracking → Kinetic →
//!   Overscroll → BounceBack, with closed-form physics sampled lazily at
//!   query time.
//! - **Aggregation** ([`scrollview`]): geometry, options, prediction, and
//!   two independent axes behind one query surface.
//! - **Handles** ([`registry`]): opaque non-reusable ids and a real
//!   monotonic clock for hosts that want the classic handle-based surface.
//!
//! # How it fits in a host
//! Feed `add_scroll*` from the platform event pump, call
//! [`Scrollview::get_pan`] (or [`ScrollRegistry::get_pan`]) once per
//! frame, and translate the content by the returned deltas. When
//! `panned == false` the render loop may block until new input arrives.
//!
//! The crate spawns no threads, never blocks, and performs bounded work
//! per call; all state advancement happens inside host calls.

pub mod axis;
pub mod classify;
pub mod clock;
pub mod error;
pub mod geometry;
pub mod log;
pub mod physics;
pub mod registry;
pub mod scrollview;
pub mod velocity;

pub use axis::{MotionTuning, Phase};
pub use classify::{ClassifierTuning, InputSource};
pub use clock::{FrameTiming, Millis, MonotonicClock};
pub use error::{GeometryError, RegistryError};
pub use geometry::{BounceEdges, Geometry};
pub use registry::{ScrollRegistry, ScrollviewId};
pub use scrollview::{Options, PanTransform, Scrollview};
