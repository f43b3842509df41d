//! # Count Pass
//!
//! One work item per entity: compute the cell id, remember it, and bump the
//! cell's atomic counter. The counters are then resolved into a plain count
//! table for the scan.
//!
//! ```text
//!   clear   counters[0..G] = 0
//!   count   cell_ids[i] = cell_of(entity[i]); counters[cell]++   (atomic)
//!   ── barrier ──
//!   resolve counts[c] = counters[c]
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use crate::dispatch::ExecutionBackend;
use crate::entity::GridEntity;
use crate::grid::index::GridIndex;

/// Runs the count pass.
///
/// `cell_ids` must hold one slot per entity, `counters` and `counts` one slot
/// per cell. Every entity lands in exactly one cell, so
/// `counts.iter().sum() == entities.len()`.
///
/// # Panics
///
/// Panics if the buffer lengths do not match the entity and cell counts.
pub fn count_pass<T, const D: usize>(
    backend: &ExecutionBackend,
    index: &GridIndex<D>,
    entities: &[T],
    cell_ids: &mut [u32],
    counters: &mut [AtomicU32],
    counts: &mut [u32],
) where
    T: GridEntity<D>,
{
    let cells = index.cell_count() as usize;
    assert_eq!(cell_ids.len(), entities.len(), "cell id buffer must match entity count");
    assert_eq!(counters.len(), cells, "counter buffer must match cell count");
    assert_eq!(counts.len(), cells, "count buffer must match cell count");

    backend.for_each_mut(counters, |_, counter| *counter.get_mut() = 0);

    let counters = &*counters;
    backend.for_each_mut(cell_ids, |i, cell| {
        let id = index.cell_of(entities[i].grid_position());
        *cell = id;
        counters[id as usize].fetch_add(1, Ordering::Relaxed);
    });

    backend.for_each_mut(counts, |c, count| {
        *count = counters[c].load(Ordering::Relaxed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(backend: &ExecutionBackend, positions: &[[f32; 2]]) -> (Vec<u32>, Vec<u32>) {
        let index = GridIndex::new([4.0, 4.0], [2, 2]).unwrap();
        let mut cell_ids = vec![0; positions.len()];
        let mut counters: Vec<AtomicU32> = (0..4).map(|_| AtomicU32::new(99)).collect();
        let mut counts = vec![0; 4];
        count_pass(backend, &index, positions, &mut cell_ids, &mut counters, &mut counts);
        (cell_ids, counts)
    }

    #[test]
    fn test_count_scenario() {
        let positions = [
            [0.0, 0.0],
            [0.0, 0.0],
            [3.0, 3.0],
            [1.0, 1.0],
            [2.0, 2.0],
            [2.0, 2.0],
            [0.0, 3.0],
            [3.0, 0.0],
        ];
        for backend in [ExecutionBackend::serial(), ExecutionBackend::parallel()] {
            let (cell_ids, counts) = run(&backend, &positions);
            assert_eq!(cell_ids, vec![0, 0, 3, 0, 3, 3, 2, 1]);
            assert_eq!(counts, vec![3, 1, 1, 3]);
        }
    }

    #[test]
    fn test_stale_counters_are_cleared() {
        // Counters start at 99; the pass must not accumulate on top.
        let (_, counts) = run(&ExecutionBackend::serial(), &[[1.0, 1.0]]);
        assert_eq!(counts, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_positions_still_counted() {
        let positions = [[f32::NAN, f32::NAN], [-1.0, 9.0], [f32::INFINITY, 0.5]];
        let (cell_ids, counts) = run(&ExecutionBackend::parallel(), &positions);
        assert_eq!(cell_ids, vec![0, 2, 1]);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }
}
