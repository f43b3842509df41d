//! # Grid View
//!
//! What a simulation kernel gets after a sort: the sorted buffer, the offset
//! table and the index scheme in one value.
//!
//! Only the buffer length is checked against the offsets. The caller must
//! pass the buffer produced by the most recent sort; a stale buffer of the
//! same length is accepted and answers queries with the wrong entities.

use std::ops::Range;

use crate::grid::index::{GridIndex, NeighborCells};

/// Read-only neighbor queries over one sorted frame.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a, T, const D: usize> {
    entities: &'a [T],
    offsets: &'a [u32],
    index: &'a GridIndex<D>,
}

impl<'a, T, const D: usize> GridView<'a, T, D> {
    /// Bundles a sorted buffer with its offset table.
    ///
    /// # Panics
    ///
    /// Panics if `offsets` does not hold `G + 1` entries or its total differs
    /// from `entities.len()`.
    #[must_use]
    pub fn new(entities: &'a [T], offsets: &'a [u32], index: &'a GridIndex<D>) -> Self {
        let cells = index.cell_count() as usize;
        assert_eq!(offsets.len(), cells + 1, "offset table must hold G + 1 entries");
        assert_eq!(
            offsets[cells] as usize,
            entities.len(),
            "sorted buffer does not match the offset table"
        );
        Self {
            entities,
            offsets,
            index,
        }
    }

    /// The sorted entity buffer.
    #[inline]
    #[must_use]
    pub const fn entities(&self) -> &'a [T] {
        self.entities
    }

    /// The cell offset table (`G + 1` entries).
    #[inline]
    #[must_use]
    pub const fn offsets(&self) -> &'a [u32] {
        self.offsets
    }

    /// The index scheme.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> &'a GridIndex<D> {
        self.index
    }

    /// Sorted slot range of a cell.
    #[inline]
    #[must_use]
    pub fn cell_range(&self, cell: u32) -> Range<usize> {
        self.offsets[cell as usize] as usize..self.offsets[cell as usize + 1] as usize
    }

    /// Entities in a cell.
    #[inline]
    #[must_use]
    pub fn cell_entities(&self, cell: u32) -> &'a [T] {
        &self.entities[self.cell_range(cell)]
    }

    /// Number of entities in a cell.
    #[inline]
    #[must_use]
    pub fn cell_population(&self, cell: u32) -> usize {
        self.cell_range(cell).len()
    }

    /// Neighbor block of a cell.
    #[inline]
    #[must_use]
    pub fn neighbor_cells(&self, cell: u32) -> NeighborCells<D> {
        self.index.neighbor_cells(cell)
    }

    /// Every `(sorted_index, entity)` in the 3^D block around `position`.
    pub fn neighbors_of(&self, position: [f32; D]) -> impl Iterator<Item = (usize, &'a T)> + 'a {
        let entities = self.entities;
        let offsets = self.offsets;
        self.index
            .neighbor_cells(self.index.cell_of(position))
            .flat_map(move |cell| {
                let start = offsets[cell as usize] as usize;
                let end = offsets[cell as usize + 1] as usize;
                (start..end).zip(&entities[start..end])
            })
    }

    /// Calls `f(sorted_index, entity)` for every candidate neighbor of `position`.
    pub fn for_each_neighbor<F>(&self, position: [f32; D], mut f: F)
    where
        F: FnMut(usize, &T),
    {
        for cell in self.index.neighbor_cells(self.index.cell_of(position)) {
            let range = self.cell_range(cell);
            for (slot, entity) in range.clone().zip(&self.entities[range]) {
                f(slot, entity);
            }
        }
    }
}
