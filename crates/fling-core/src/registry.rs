#![forbid(unsafe_code)]

//! Handle registry: owns scrollview instances and stamps call times.
//!
//! Hosts that drive [`Scrollview`] directly pass `now` themselves; the
//! registry is the convenience layer for hosts that want a handle-shaped
//! surface: opaque ids, a real monotonic clock, and loud failures on dead
//! handles.
//!
//! Handles are never reused within a registry's lifetime, so a
//! use-after-destroy always resolves to
//! [`RegistryError::InvalidHandle`] instead of silently aliasing a newer
//! scrollview.

use std::collections::HashMap;

use crate::classify::InputSource;
use crate::clock::MonotonicClock;
use crate::error::RegistryError;
use crate::geometry::Geometry;
use crate::scrollview::{Options, PanTransform, Scrollview};

/// Opaque, non-reusable scrollview handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollviewId(u64);

impl ScrollviewId {
    /// The raw id, for logging and diagnostics.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Owner of all scrollview state, addressed by [`ScrollviewId`].
#[derive(Debug)]
pub struct ScrollRegistry {
    clock: MonotonicClock,
    views: HashMap<u64, Scrollview>,
    next_id: u64,
}

impl ScrollRegistry {
    /// Create an empty registry with a fresh monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: MonotonicClock::new(),
            views: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a scrollview, with geometry or unconfigured.
    ///
    /// Without geometry the view has zero extents and answers queries with
    /// inert transforms until geometry arrives via
    /// [`ScrollRegistry::signal_geometry`].
    pub fn create(&mut self, geometry: Option<Geometry>) -> Result<ScrollviewId, RegistryError> {
        let view = match geometry {
            Some(geometry) => Scrollview::new(geometry)?,
            None => Scrollview::unconfigured(),
        };
        let id = self.next_id;
        self.next_id += 1;
        self.views.insert(id, view);
        Ok(ScrollviewId(id))
    }

    /// Tear down a scrollview. Its handle is invalid afterwards.
    pub fn destroy(&mut self, id: ScrollviewId) -> Result<(), RegistryError> {
        self.views
            .remove(&id.0)
            .map(|_| ())
            .ok_or(RegistryError::InvalidHandle { id: id.0 })
    }

    /// Number of live scrollviews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether the registry holds no scrollviews.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Borrow a scrollview.
    pub fn view(&self, id: ScrollviewId) -> Result<&Scrollview, RegistryError> {
        self.views
            .get(&id.0)
            .ok_or(RegistryError::InvalidHandle { id: id.0 })
    }

    /// Mutably borrow a scrollview, for hosts driving it with their own
    /// timestamps.
    pub fn view_mut(&mut self, id: ScrollviewId) -> Result<&mut Scrollview, RegistryError> {
        self.views
            .get_mut(&id.0)
            .ok_or(RegistryError::InvalidHandle { id: id.0 })
    }

    // -- forwarded operations, stamped with the registry clock --------------

    /// Update a scrollview's geometry.
    pub fn signal_geometry(
        &mut self,
        id: ScrollviewId,
        geometry: Geometry,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.set_geometry(geometry, now)?;
        Ok(())
    }

    /// Declare the input source for subsequent deltas.
    pub fn set_input_source(
        &mut self,
        id: ScrollviewId,
        source: InputSource,
    ) -> Result<(), RegistryError> {
        self.view_mut(id)?.set_input_source(source);
        Ok(())
    }

    /// Set per-axis normalization factors.
    pub fn set_scale_factor(
        &mut self,
        id: ScrollviewId,
        fx: f64,
        fy: f64,
    ) -> Result<(), RegistryError> {
        self.view_mut(id)?.set_scale_factor(fx, fy);
        Ok(())
    }

    /// Replace the options bitset.
    pub fn set_options(&mut self, id: ScrollviewId, options: Options) -> Result<(), RegistryError> {
        self.view_mut(id)?.set_options(options);
        Ok(())
    }

    /// Store the frame latency estimate for subsequent pans.
    pub fn set_predict(
        &mut self,
        id: ScrollviewId,
        ms_to_vsync: f64,
        ms_avg_frametime: f64,
    ) -> Result<(), RegistryError> {
        self.view_mut(id)?.set_predict(ms_to_vsync, ms_avg_frametime);
        Ok(())
    }

    /// Queue a two-axis device delta.
    pub fn add_scroll(&mut self, id: ScrollviewId, dx: f64, dy: f64) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.add_scroll(dx, dy, now);
        Ok(())
    }

    /// Queue an x-axis device delta.
    pub fn add_scroll_x(&mut self, id: ScrollviewId, dx: f64) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.add_scroll_x(dx, now);
        Ok(())
    }

    /// Queue a y-axis device delta.
    pub fn add_scroll_y(&mut self, id: ScrollviewId, dy: f64) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.add_scroll_y(dy, now);
        Ok(())
    }

    /// Halt kinetic motion: the user re-engaged the device.
    pub fn add_scroll_interrupt(&mut self, id: ScrollviewId) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.add_scroll_interrupt(now);
        Ok(())
    }

    /// End the gesture, possibly starting a fling.
    pub fn add_scroll_release(&mut self, id: ScrollviewId) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.add_scroll_release(now);
        Ok(())
    }

    /// Synchronously pan by `(dx, dy)` dp.
    pub fn force_pan(&mut self, id: ScrollviewId, dx: f64, dy: f64) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.force_pan(dx, dy, now);
        Ok(())
    }

    /// Synchronously jump to `(x, y)` dp.
    pub fn force_jump(&mut self, id: ScrollviewId, x: f64, y: f64) -> Result<(), RegistryError> {
        let now = self.clock.now_ms();
        self.view_mut(id)?.force_jump(x, y, now);
        Ok(())
    }

    /// Consume queued events and return the unread pan transform.
    pub fn get_pan(&mut self, id: ScrollviewId) -> Result<PanTransform, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self.view_mut(id)?.get_pan(now))
    }

    /// [`ScrollRegistry::set_predict`] followed by
    /// [`ScrollRegistry::get_pan`].
    pub fn get_pan_predict(
        &mut self,
        id: ScrollviewId,
        ms_to_vsync: f64,
        ms_avg_frametime: f64,
    ) -> Result<PanTransform, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self
            .view_mut(id)?
            .get_pan_predict(ms_to_vsync, ms_avg_frametime, now))
    }

    /// Unread x pan in dp (consumes the x accumulator only).
    pub fn get_pan_x(&mut self, id: ScrollviewId) -> Result<i64, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self.view_mut(id)?.get_pan_x(now))
    }

    /// Unread y pan in dp (consumes the y accumulator only).
    pub fn get_pan_y(&mut self, id: ScrollviewId) -> Result<i64, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self.view_mut(id)?.get_pan_y(now))
    }

    /// Absolute x of the viewport origin.
    pub fn get_pos_x(&mut self, id: ScrollviewId) -> Result<i64, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self.view_mut(id)?.get_pos_x(now))
    }

    /// Absolute y of the viewport origin.
    pub fn get_pos_y(&mut self, id: ScrollviewId) -> Result<i64, RegistryError> {
        let now = self.clock.now_ms();
        Ok(self.view_mut(id)?.get_pos_y(now))
    }
}

impl Default for ScrollRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
