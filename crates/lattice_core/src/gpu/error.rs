//! GPU path errors.

use thiserror::Error;

use crate::error::GridError;

/// Errors raised by [`crate::gpu::GpuGridSorter`].
#[derive(Error, Debug)]
pub enum GpuError {
    /// No adapter matched the request.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// The adapter refused to create a device.
    #[error("failed to create GPU device: {0}")]
    RequestDevice(String),

    /// Record size is zero or not a multiple of 4 bytes.
    #[error("record of {0} bytes cannot be copied as u32 words")]
    UnsupportedRecord(usize),

    /// Only 1, 2 and 3 dimensional grids fit the `vec4` position layout.
    #[error("{0}-dimensional grids are not supported on the GPU")]
    UnsupportedDimension(usize),

    /// A dispatch would exceed the per-dimension workgroup limit.
    #[error("{items} work items exceed the dispatch limit")]
    DispatchTooLarge {
        /// Items that would be dispatched.
        items: usize,
    },

    /// Mapping a staging buffer failed.
    #[error("GPU readback failed: {0}")]
    Readback(String),

    /// Configuration or buffer length error.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Result type for the GPU path.
pub type GpuResult<T> = Result<T, GpuError>;
