#![forbid(unsafe_code)]

//! Error types for the registry and geometry surfaces.
//!
//! Event ingestion (`add_scroll_*`) is total on a valid scrollview:
//! malformed numeric values are saturated, never reported. Errors exist only
//! where the host can hand us something structurally wrong, a dead handle
//! or a negative extent.

use thiserror::Error;

/// Errors from [`ScrollRegistry`](crate::registry::ScrollRegistry)
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RegistryError {
    /// The handle was never issued, or its scrollview was destroyed.
    /// Handles are not reused, so stale handles always land here rather
    /// than aliasing a newer scrollview.
    #[error("unknown or destroyed scrollview handle (id {id})")]
    InvalidHandle {
        /// The raw id that failed to resolve.
        id: u64,
    },

    /// Geometry handed to create/signal was rejected.
    #[error(transparent)]
    InvalidGeometry(#[from] GeometryError),
}

/// Errors from geometry validation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// An extent was negative or non-finite.
    #[error("geometry extent must be finite and non-negative: {field} = {value}")]
    InvalidExtent {
        /// Which field was rejected.
        field: &'static str,
        /// The offending value.
        value: f64,
    },
}
