//! # Grid Optimizer
//!
//! Owns the grid configuration and every per-frame buffer, and drives the
//! count → scan → scatter passes once per [`GridOptimizer::sort`].
//!
//! ## Frame Flow
//!
//! ```text
//!   entities (caller Vec, N)
//!        │
//!        ▼  count      cell_ids[N], counters[G] → counts[G]
//!        ▼  scan       offsets[G + 1]
//!        ▼  scatter    scratch[N] (grouped by cell), entries[N]
//!        │
//!        └── swap(caller Vec, scratch)        O(1), no copy
//! ```
//!
//! After `sort` returns, the caller's vector *is* the sorted buffer and
//! [`GridOptimizer::offset_table`] describes it.
//!
//! ## Lifecycle
//!
//! `new` → `sort` (any number of times) → `release` (terminal). Using the
//! optimizer after `release` panics; a second `release` does nothing. Drop
//! releases automatically.

use std::ops::Range;
use std::sync::atomic::AtomicU32;
use std::time::{Duration, Instant};

use crate::dispatch::ExecutionBackend;
use crate::entity::{GridEntity, GridEntry};
use crate::error::{GridError, GridResult};
use crate::grid::config::GridConfig;
use crate::grid::count::count_pass;
use crate::grid::index::GridIndex;
use crate::grid::scan::{exclusive_scan, scan_block_count, CountSummary};
use crate::grid::scatter::{scatter_pass, ScatterTargets};
use crate::grid::view::GridView;

/// Statistics for one sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Sort number, starting at 1.
    pub frame: u64,
    /// Entities sorted.
    pub entity_count: usize,
    /// Cells holding at least one entity.
    pub occupied_cells: usize,
    /// Largest cell population.
    pub max_cell_population: u32,
    /// Time spent in the count pass.
    pub count_time: Duration,
    /// Time spent in the prefix sum.
    pub scan_time: Duration,
    /// Time spent in the scatter pass.
    pub scatter_time: Duration,
}

impl SortStats {
    /// Total time across all passes.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.count_time + self.scan_time + self.scatter_time
    }
}

/// Every buffer the optimizer owns, allocated once for `N` and `G`.
struct GridBuffers<T> {
    /// Per-entity cell id, input order (N).
    cell_ids: Box<[u32]>,
    /// Atomic counters during count, write cursors during scatter (G).
    counters: Box<[AtomicU32]>,
    /// Resolved per-cell counts (G).
    counts: Box<[u32]>,
    /// Scan workspace, one summary per block.
    scan_blocks: Box<[CountSummary]>,
    /// Cell offset table (G + 1).
    offsets: Box<[u32]>,
    /// Sorted slot → source index (N).
    slots: Box<[AtomicU32]>,
    /// Sorted (cell, source index) pairs (N).
    entries: Box<[GridEntry]>,
    /// Scatter target, swapped with the caller's buffer (N).
    scratch: Vec<T>,
}

impl<T: bytemuck::Zeroable + Clone> GridBuffers<T> {
    fn new(entity_count: usize, cell_count: usize) -> Self {
        Self {
            cell_ids: vec![0; entity_count].into_boxed_slice(),
            counters: (0..cell_count).map(|_| AtomicU32::new(0)).collect(),
            counts: vec![0; cell_count].into_boxed_slice(),
            scan_blocks: vec![CountSummary::default(); scan_block_count(cell_count)]
                .into_boxed_slice(),
            // Before the first sort every entity counts as living in cell 0.
            offsets: std::iter::once(0)
                .chain(std::iter::repeat(entity_count as u32).take(cell_count))
                .collect(),
            slots: (0..entity_count).map(|_| AtomicU32::new(0)).collect(),
            entries: vec![GridEntry::default(); entity_count].into_boxed_slice(),
            scratch: vec![T::zeroed(); entity_count],
        }
    }
}

/// Uniform-grid counting sort for `N` entities of type `T` in `D` dimensions.
///
/// # Example
///
/// ```rust
/// use lattice_core::GridOptimizer;
///
/// let mut positions: Vec<[f32; 2]> = vec![[3.0, 3.0], [0.5, 0.5], [3.5, 0.5], [0.5, 3.5]];
/// let mut grid = GridOptimizer::new(positions.len(), [4.0, 4.0], [2, 2]).unwrap();
///
/// grid.sort(&mut positions).unwrap();
///
/// assert_eq!(grid.offset_table(), &[0, 1, 2, 3, 4]);
/// assert_eq!(positions, vec![[0.5, 0.5], [3.5, 0.5], [0.5, 3.5], [3.0, 3.0]]);
/// ```
pub struct GridOptimizer<T: GridEntity<D>, const D: usize> {
    config: GridConfig<D>,
    index: GridIndex<D>,
    backend: ExecutionBackend,
    buffers: Option<GridBuffers<T>>,
    frame: u64,
}

/// 2D optimizer.
pub type GridOptimizer2D<T> = GridOptimizer<T, 2>;
/// 3D optimizer.
pub type GridOptimizer3D<T> = GridOptimizer<T, 3>;

impl<T: GridEntity<D>, const D: usize> GridOptimizer<T, D> {
    /// Creates an optimizer on the default (parallel) backend.
    ///
    /// # Errors
    ///
    /// Fails with a [`GridError`] configuration variant if `entity_count` is
    /// zero, an axis has no cells, or a range is not finite and positive.
    pub fn new(entity_count: usize, range: [f32; D], grid_dim: [u32; D]) -> GridResult<Self> {
        Self::with_backend(entity_count, range, grid_dim, ExecutionBackend::default())
    }

    /// Creates an optimizer on the given backend.
    ///
    /// # Errors
    ///
    /// See [`GridOptimizer::new`].
    pub fn with_backend(
        entity_count: usize,
        range: [f32; D],
        grid_dim: [u32; D],
        backend: ExecutionBackend,
    ) -> GridResult<Self> {
        Self::from_config(GridConfig::new(entity_count, range, grid_dim), backend)
    }

    /// Creates an optimizer from a configuration.
    ///
    /// # Errors
    ///
    /// See [`GridOptimizer::new`].
    pub fn from_config(config: GridConfig<D>, backend: ExecutionBackend) -> GridResult<Self> {
        let cell_count = config.validate()?;
        let index = GridIndex::new(config.range, config.grid_dim)?;

        tracing::info!(
            entities = config.entity_count,
            cells = cell_count,
            grid_dim = ?config.grid_dim,
            backend = backend.name(),
            "grid optimizer created"
        );

        Ok(Self {
            config,
            index,
            backend,
            buffers: Some(GridBuffers::new(config.entity_count, cell_count as usize)),
            frame: 0,
        })
    }

    fn live(&self) -> &GridBuffers<T> {
        match &self.buffers {
            Some(buffers) => buffers,
            None => panic!("{}", GridError::UseAfterRelease),
        }
    }

    /// Sorts `entities` by cell.
    ///
    /// On success `entities` holds the sorted records, grouped so that cell
    /// `c` occupies `offset_table()[c]..offset_table()[c + 1]`. Call once per
    /// simulation step, before that step's neighbor queries.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EntityCountMismatch`] if `entities.len()` differs
    /// from the entity count given at construction. Nothing is modified in
    /// that case.
    ///
    /// # Panics
    ///
    /// Panics if called after [`GridOptimizer::release`].
    pub fn sort(&mut self, entities: &mut Vec<T>) -> GridResult<SortStats> {
        let Some(buffers) = self.buffers.as_mut() else {
            panic!("{}", GridError::UseAfterRelease);
        };

        let expected = self.config.entity_count;
        if entities.len() != expected {
            tracing::warn!(expected, actual = entities.len(), "grid sort rejected buffer");
            return Err(GridError::EntityCountMismatch {
                expected,
                actual: entities.len(),
            });
        }

        let backend = &self.backend;

        let start = Instant::now();
        count_pass(
            backend,
            &self.index,
            entities.as_slice(),
            &mut buffers.cell_ids,
            &mut buffers.counters,
            &mut buffers.counts,
        );
        let count_time = start.elapsed();

        let start = Instant::now();
        let summary = exclusive_scan(
            backend,
            &buffers.counts,
            &mut buffers.offsets,
            &mut buffers.scan_blocks,
        );
        debug_assert_eq!(summary.total as usize, expected, "every entity must land in a cell");
        let scan_time = start.elapsed();

        let start = Instant::now();
        scatter_pass(
            backend,
            entities.as_slice(),
            &buffers.cell_ids,
            &buffers.offsets,
            ScatterTargets {
                cursors: &mut buffers.counters,
                slots: &buffers.slots,
                entries: &mut buffers.entries,
                sorted: &mut buffers.scratch,
            },
        );
        std::mem::swap(entities, &mut buffers.scratch);
        let scatter_time = start.elapsed();

        self.frame += 1;
        let stats = SortStats {
            frame: self.frame,
            entity_count: expected,
            occupied_cells: summary.occupied as usize,
            max_cell_population: summary.max,
            count_time,
            scan_time,
            scatter_time,
        };

        tracing::debug!(
            frame = stats.frame,
            occupied = stats.occupied_cells,
            max_population = stats.max_cell_population,
            count_us = count_time.as_micros() as u64,
            scan_us = scan_time.as_micros() as u64,
            scatter_us = scatter_time.as_micros() as u64,
            "grid sort"
        );

        Ok(stats)
    }

    /// Cell offset table of the last sort (`G + 1` entries).
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`].
    #[must_use]
    pub fn offset_table(&self) -> &[u32] {
        &self.live().offsets
    }

    /// Per-cell entity counts of the last sort (`G` entries).
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`].
    #[must_use]
    pub fn cell_counts(&self) -> &[u32] {
        &self.live().counts
    }

    /// Cell id of every entity, in the input order of the last sort.
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`].
    #[must_use]
    pub fn cell_ids(&self) -> &[u32] {
        &self.live().cell_ids
    }

    /// Sorted `(cell, source index)` pairs of the last sort.
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`].
    #[must_use]
    pub fn grid_entries(&self) -> &[GridEntry] {
        &self.live().entries
    }

    /// Sorted slot range of a cell.
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`] or if `cell >= G`.
    #[must_use]
    pub fn cell_range(&self, cell: u32) -> Range<usize> {
        let offsets = &self.live().offsets;
        offsets[cell as usize] as usize..offsets[cell as usize + 1] as usize
    }

    /// Neighbor-query view over a sorted buffer.
    ///
    /// `sorted` must be the buffer the most recent [`GridOptimizer::sort`]
    /// produced. Only its length is checked.
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`] or if `sorted` is not `N` long.
    #[must_use]
    pub fn view<'a>(&'a self, sorted: &'a [T]) -> GridView<'a, T, D> {
        GridView::new(sorted, &self.live().offsets, &self.index)
    }

    /// Largest cell edge, the neighbor-search radius hint.
    ///
    /// # Panics
    ///
    /// Panics after [`GridOptimizer::release`], as do the other shape
    /// accessors below.
    #[inline]
    #[must_use]
    pub fn cell_h(&self) -> f32 {
        self.live();
        self.index.cell_h()
    }

    /// Index scheme.
    #[inline]
    #[must_use]
    pub fn index(&self) -> &GridIndex<D> {
        self.live();
        &self.index
    }

    /// Configuration given at construction.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GridConfig<D> {
        self.live();
        &self.config
    }

    /// Entity count `N`.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.live();
        self.config.entity_count
    }

    /// Cell count `G`.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> u32 {
        self.live();
        self.index.cell_count()
    }

    /// Cell count along each axis.
    #[inline]
    #[must_use]
    pub fn grid_dim(&self) -> [u32; D] {
        self.live();
        self.config.grid_dim
    }

    /// Backend the passes run on.
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &ExecutionBackend {
        self.live();
        &self.backend
    }

    /// Number of completed sorts.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether [`GridOptimizer::release`] has been called.
    #[inline]
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.buffers.is_none()
    }

    /// Non-panicking liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UseAfterRelease`] once released.
    pub const fn check_live(&self) -> GridResult<()> {
        if self.buffers.is_some() {
            Ok(())
        } else {
            Err(GridError::UseAfterRelease)
        }
    }

    /// Frees every owned buffer. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            tracing::info!(frames = self.frame, "grid optimizer released");
        } else {
            tracing::trace!("grid optimizer already released");
        }
    }
}

impl<T: GridEntity<D>, const D: usize> Drop for GridOptimizer<T, D> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: GridEntity<D>, const D: usize> std::fmt::Debug for GridOptimizer<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridOptimizer")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .field("frame", &self.frame)
            .field("released", &self.is_released())
            .finish()
    }
}
