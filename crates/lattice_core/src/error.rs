//! # Grid Error Types
//!
//! All errors that can occur while building or running the grid sort.
//!
//! Out-of-range and NaN positions are deliberately absent: they are clamped
//! into an edge cell by the index scheme and never surface as errors.

use thiserror::Error;

/// Errors that can occur in the grid sort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Entity count is zero or does not fit the `u32` index space.
    #[error("invalid entity count: {0} (must be in 1..=u32::MAX)")]
    InvalidEntityCount(usize),

    /// A grid axis has zero cells.
    #[error("invalid grid dimension: axis {axis} has {value} cells")]
    InvalidGridDimension {
        /// Axis index (0 = x).
        axis: usize,
        /// The offending cell count.
        value: u32,
    },

    /// A world range axis is not a finite positive number.
    #[error("invalid range: axis {axis} is {value}")]
    InvalidRange {
        /// Axis index (0 = x).
        axis: usize,
        /// The offending extent.
        value: f32,
    },

    /// The product of the grid dimensions overflows the `u32` cell id space.
    #[error("cell count overflow: grid dimensions {0:?} exceed u32 cell ids")]
    CellCountOverflow(Vec<u32>),

    /// The buffer handed to `sort` does not hold exactly `N` entities.
    #[error("entity count mismatch: optimizer built for {expected}, buffer holds {actual}")]
    EntityCountMismatch {
        /// Entity count fixed at construction.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// The optimizer was used after `release()`.
    #[error("grid optimizer used after release")]
    UseAfterRelease,

    /// The dedicated rayon pool could not be built.
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
