//! # Grid Sort Properties
//!
//! Randomised checks of the sort invariants on 2D and 3D grids.

use lattice_core::{ExecutionBackend, GridIndex, GridOptimizer};
use proptest::prelude::*;

fn backend(parallel: bool) -> ExecutionBackend {
    if parallel {
        ExecutionBackend::parallel()
    } else {
        ExecutionBackend::serial()
    }
}

/// Sortable key for bitwise multiset comparison.
fn bits<const D: usize>(p: &[f32; D]) -> [u32; D] {
    p.map(f32::to_bits)
}

fn check_sorted<const D: usize>(
    original: &[[f32; D]],
    sorted: &[[f32; D]],
    offsets: &[u32],
    index: &GridIndex<D>,
) -> Result<(), TestCaseError> {
    let g = index.cell_count() as usize;
    prop_assert_eq!(offsets.len(), g + 1);
    prop_assert_eq!(offsets[0], 0);
    prop_assert_eq!(offsets[g] as usize, original.len());
    prop_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    // Every slice holds only its own cell's entities.
    for cell in 0..g {
        for p in &sorted[offsets[cell] as usize..offsets[cell + 1] as usize] {
            prop_assert_eq!(index.cell_of(*p) as usize, cell);
        }
    }

    // Same multiset of records.
    let mut a: Vec<[u32; D]> = original.iter().map(bits).collect();
    let mut b: Vec<[u32; D]> = sorted.iter().map(bits).collect();
    a.sort_unstable();
    b.sort_unstable();
    prop_assert_eq!(a, b);
    Ok(())
}

proptest! {
    #[test]
    fn prop_sort_2d_groups_by_cell(
        dim_x in 1u32..12,
        dim_y in 1u32..12,
        range_x in 1.0f32..200.0,
        range_y in 1.0f32..200.0,
        unit in prop::collection::vec((-0.2f32..1.2, -0.2f32..1.2), 1..400),
        parallel in any::<bool>(),
    ) {
        let original: Vec<[f32; 2]> = unit.iter().map(|&(u, v)| [u * range_x, v * range_y]).collect();
        let mut sorted = original.clone();
        let mut grid = GridOptimizer::with_backend(
            original.len(),
            [range_x, range_y],
            [dim_x, dim_y],
            backend(parallel),
        ).unwrap();

        grid.sort(&mut sorted).unwrap();

        prop_assert_eq!(grid.cell_counts().iter().sum::<u32>() as usize, original.len());
        check_sorted(&original, &sorted, grid.offset_table(), grid.index())?;
    }

    #[test]
    fn prop_sort_3d_groups_by_cell(
        dims in (1u32..6, 1u32..6, 1u32..6),
        unit in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0, 0.0f32..1.0), 1..300),
        parallel in any::<bool>(),
    ) {
        let range = [10.0, 20.0, 30.0];
        let original: Vec<[f32; 3]> = unit
            .iter()
            .map(|&(u, v, w)| [u * range[0], v * range[1], w * range[2]])
            .collect();
        let mut sorted = original.clone();
        let mut grid = GridOptimizer::with_backend(
            original.len(),
            range,
            [dims.0, dims.1, dims.2],
            backend(parallel),
        ).unwrap();

        grid.sort(&mut sorted).unwrap();

        check_sorted(&original, &sorted, grid.offset_table(), grid.index())?;
    }

    #[test]
    fn prop_resort_keeps_offsets(
        unit in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..200),
    ) {
        let mut positions: Vec<[f32; 2]> = unit.iter().map(|&(u, v)| [u * 128.0, v * 128.0]).collect();
        let mut grid = GridOptimizer::new(positions.len(), [128.0, 128.0], [16, 16]).unwrap();

        grid.sort(&mut positions).unwrap();
        let first = grid.offset_table().to_vec();
        grid.sort(&mut positions).unwrap();

        prop_assert_eq!(grid.offset_table(), first.as_slice());
    }

    #[test]
    fn prop_entries_point_back_to_source(
        unit in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..200),
    ) {
        let original: Vec<[f32; 2]> = unit.iter().map(|&(u, v)| [u * 64.0, v * 64.0]).collect();
        let mut sorted = original.clone();
        let mut grid = GridOptimizer::new(original.len(), [64.0, 64.0], [8, 8]).unwrap();
        grid.sort(&mut sorted).unwrap();

        let mut seen = vec![false; original.len()];
        for (slot, entry) in grid.grid_entries().iter().enumerate() {
            prop_assert!(!seen[entry.index as usize]);
            seen[entry.index as usize] = true;
            prop_assert_eq!(bits(&sorted[slot]), bits(&original[entry.index as usize]));
        }
        prop_assert!(seen.into_iter().all(|s| s));
    }
}
