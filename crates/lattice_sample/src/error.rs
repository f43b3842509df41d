//! Sample error types.

use thiserror::Error;

use lattice_core::GridError;

use crate::config::ConfigError;

/// Errors raised while running the sample.
#[derive(Error, Debug)]
pub enum SampleError {
    /// The configuration could not be loaded or is invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// The grid sort rejected its input.
    #[error("grid: {0}")]
    Grid(#[from] GridError),
}

/// Result type for the sample.
pub type SampleResult<T> = Result<T, SampleError>;
