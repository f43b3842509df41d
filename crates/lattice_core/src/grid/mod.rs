//! # Uniform Grid Counting Sort
//!
//! Three data-parallel passes turn an unordered entity buffer into one that
//! is grouped by grid cell, plus an offset table locating every cell's group.
//!
//! ```text
//!   positions ──► count ──► scan ──► scatter ──► sorted buffer
//!                   │         │          │
//!              counts[G]  offsets[G+1]  entries[N]
//! ```
//!
//! Cells are numbered row-major with the x axis fastest:
//! `id = x + y * dim_x (+ z * dim_x * dim_y)`.
//!
//! Neighbor search then only visits the 3^D block around a cell instead of
//! all `N` entities.

mod config;
mod count;
mod index;
mod optimizer;
mod scan;
mod scatter;
mod view;

pub use config::{GridConfig, GridConfig2D, GridConfig3D};
pub use count::count_pass;
pub use index::{GridIndex, NeighborCells};
pub use optimizer::{GridOptimizer, GridOptimizer2D, GridOptimizer3D, SortStats};
pub use scan::{exclusive_scan, scan_block_count, CountSummary, SCAN_BLOCK_SIZE};
pub use scatter::{scatter_pass, ScatterTargets};
pub use view::GridView;
