//! # GPU Grid Sort
//!
//! The same count → scan → scatter passes as the CPU path, as WGSL compute
//! kernels dispatched through `wgpu`.
//!
//! ```text
//!   upload(&[T])   records ──► records[cur]     positions ──► positions[cur]
//!   sort()         clear │ count │ scan │ scatter      (one submission)
//!                  cur ^= 1
//!   read_*()       staging copy ──► map_async ──► Vec
//! ```
//!
//! The kernel sources are always compiled; the device side needs the `gpu`
//! feature.

pub mod shaders;

#[cfg(feature = "gpu")]
mod error;
#[cfg(feature = "gpu")]
mod sorter;

pub use shaders::{GridSortParams, GridSortShaders};

#[cfg(feature = "gpu")]
pub use error::{GpuError, GpuResult};
#[cfg(feature = "gpu")]
pub use sorter::GpuGridSorter;
