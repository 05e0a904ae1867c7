#![forbid(unsafe_code)]

//! Scrollview geometry: content and viewport extents, bounce flags, and
//! the per-axis legal range derived from them.
//!
//! Positions are device-independent pixels (dp). The viewport origin `p` on
//! an axis is legal in `[0, content − viewport]`; a viewport larger than the
//! content pins the axis at 0 and disables bounce on that axis regardless of
//! the configured flags.

use crate::error::GeometryError;

/// Per-edge overscroll bounce flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BounceEdges {
    /// Allow overscroll past the top edge (`y < 0`).
    pub top: bool,
    /// Allow overscroll past the bottom edge (`y > max`).
    pub bottom: bool,
    /// Allow overscroll past the left edge (`x < 0`).
    pub left: bool,
    /// Allow overscroll past the right edge (`x > max`).
    pub right: bool,
}

impl BounceEdges {
    /// Bounce enabled on every edge.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            top: true,
            bottom: true,
            left: true,
            right: true,
        }
    }

    /// Bounce disabled everywhere (hard clamping at edges).
    #[must_use]
    pub const fn none() -> Self {
        Self {
            top: false,
            bottom: false,
            left: false,
            right: false,
        }
    }
}

/// Axis selector for routing events and deriving bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisId {
    /// The x axis (viewport origin moves left/right).
    Horizontal,
    /// The y axis (viewport origin moves up/down).
    Vertical,
}

/// Content and viewport extents plus bounce behavior, all in dp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Content width in dp.
    pub content_width: f64,
    /// Content height in dp.
    pub content_height: f64,
    /// Viewport width in dp.
    pub viewport_width: f64,
    /// Viewport height in dp.
    pub viewport_height: f64,
    /// Initial x offset of the viewport origin into the content.
    pub initial_x: f64,
    /// Initial y offset of the viewport origin into the content.
    pub initial_y: f64,
    /// Which edges rubber-band instead of clamping.
    pub bounce: BounceEdges,
}

impl Geometry {
    /// Build a geometry with the given extents, no bounce, origin at (0, 0).
    #[must_use]
    pub fn new(
        content_width: f64,
        content_height: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            content_width,
            content_height,
            viewport_width,
            viewport_height,
            ..Self::default()
        }
    }

    /// Set the bounce flags (builder pattern).
    #[must_use]
    pub fn with_bounce(mut self, bounce: BounceEdges) -> Self {
        self.bounce = bounce;
        self
    }

    /// Set the initial viewport origin (builder pattern).
    #[must_use]
    pub fn with_initial(mut self, x: f64, y: f64) -> Self {
        self.initial_x = x;
        self.initial_y = y;
        self
    }

    /// Validate the extents: each must be finite and non-negative.
    ///
    /// Initial offsets are not validated; they are clamped into the legal
    /// range when applied.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let fields = [
            ("content_width", self.content_width),
            ("content_height", self.content_height),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(GeometryError::InvalidExtent { field, value });
            }
        }
        Ok(())
    }

    /// Derive the legal range and bounce behavior for one axis.
    #[must_use]
    pub fn axis_bounds(&self, axis: AxisId) -> AxisBounds {
        let (content, viewport, bounce_min, bounce_max) = match axis {
            AxisId::Horizontal => (
                self.content_width,
                self.viewport_width,
                self.bounce.left,
                self.bounce.right,
            ),
            AxisId::Vertical => (
                self.content_height,
                self.viewport_height,
                self.bounce.top,
                self.bounce.bottom,
            ),
        };

        // A viewport larger than the content pins the axis at 0 with bounce
        // off, whatever the flags say.
        if viewport > content {
            return AxisBounds {
                max: 0.0,
                viewport,
                bounce_min: false,
                bounce_max: false,
            };
        }

        AxisBounds {
            max: content - viewport,
            viewport,
            bounce_min,
            bounce_max,
        }
    }

    /// Initial origin for one axis.
    #[must_use]
    pub fn initial(&self, axis: AxisId) -> f64 {
        match axis {
            AxisId::Horizontal => self.initial_x,
            AxisId::Vertical => self.initial_y,
        }
    }
}

/// The legal position range for one axis, plus which of its edges bounce.
///
/// The minimum edge is always 0; `max` is `max(0, content − viewport)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    /// Maximum legal viewport origin.
    pub max: f64,
    /// Viewport extent on this axis (scales overscroll resistance).
    pub viewport: f64,
    /// Whether the `p < 0` side rubber-bands.
    pub bounce_min: bool,
    /// Whether the `p > max` side rubber-bands.
    pub bounce_max: bool,
}

impl AxisBounds {
    /// Whether `p` is within the legal range.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: f64) -> bool {
        (0.0..=self.max).contains(&p)
    }

    /// Clamp `p` into the legal range.
    #[inline]
    #[must_use]
    pub fn clamp(&self, p: f64) -> f64 {
        p.clamp(0.0, self.max)
    }

    /// Signed distance past the nearest violated edge; 0 inside the range.
    /// Negative past the minimum edge, positive past the maximum edge.
    #[inline]
    #[must_use]
    pub fn overshoot(&self, p: f64) -> f64 {
        if p < 0.0 {
            p
        } else if p > self.max {
            p - self.max
        } else {
            0.0
        }
    }

    /// The edge nearest to `p` (the violated edge when `p` is outside).
    #[inline]
    #[must_use]
    pub fn nearest_edge(&self, p: f64) -> f64 {
        if p < 0.0 {
            0.0
        } else if p > self.max {
            self.max
        } else if p * 2.0 <= self.max {
            0.0
        } else {
            self.max
        }
    }

    /// Whether the edge in the direction of travel `sign(v)` bounces.
    #[inline]
    #[must_use]
    pub fn bounces_toward(&self, velocity: f64) -> bool {
        if velocity < 0.0 {
            self.bounce_min
        } else {
            self.bounce_max
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
