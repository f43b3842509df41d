//! # LATTICE Core
//!
//! Uniform-grid counting sort for particle-style neighbor search.
//!
//! Every frame, entities are bucketed into a regular grid and the entity
//! buffer is reordered so each cell's entities sit next to each other. An
//! offset table locates each cell's slice, and a kernel then only visits the
//! 3^D cells around an entity instead of all `N` entities.
//!
//! ## Architecture Rules
//!
//! 1. **Buffers are sized once** - `GridOptimizer::new` allocates everything
//! 2. **Passes are data-parallel** - count, scan and scatter dispatch work items
//! 3. **No unsafe** - shared state is mutated through atomics only
//!
//! ## Example
//!
//! ```rust
//! use lattice_core::{DoubleBuffer, GridOptimizer};
//!
//! let positions: Vec<[f32; 2]> = (0..64)
//!     .map(|i| [(i % 8) as f32 * 16.0, (i / 8) as f32 * 16.0])
//!     .collect();
//! let mut frames = DoubleBuffer::new(positions);
//! let mut grid = GridOptimizer::new(64, [128.0, 128.0], [8, 8]).unwrap();
//!
//! grid.sort(frames.read_vec_mut()).unwrap();
//! let view = grid.view(frames.read());
//! let near_origin = view.neighbors_of([0.0, 0.0]).count();
//! assert_eq!(near_origin, 4);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod dispatch;
pub mod entity;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod sync;

pub use dispatch::{BackendKind, ExecutionBackend, SIMULATION_BLOCK_SIZE};
pub use entity::{GridEntity, GridEntry};
pub use error::{GridError, GridResult};
pub use grid::{
    GridConfig, GridConfig2D, GridConfig3D, GridIndex, GridOptimizer, GridOptimizer2D,
    GridOptimizer3D, GridView, NeighborCells, SortStats,
};
pub use sync::DoubleBuffer;
