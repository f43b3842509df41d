//! # Grid Index Scheme
//!
//! Pure mapping between continuous positions and flat cell ids.
//!
//! ```text
//!   position ──÷ cell_size──▶ floor ──clamp──▶ coord ──row-major──▶ id
//!
//!   id = x + y * dim.x (+ z * dim.x * dim.y)
//! ```
//!
//! ## Clamp policy
//!
//! Each axis is converted with a saturating float → int cast and then clamped
//! to `[0, dim - 1]`:
//!
//! - negative values and `-inf` → cell 0 on that axis
//! - values `>= range` and `+inf` → last cell on that axis
//! - NaN → cell 0 on that axis
//!
//! Every position therefore has exactly one cell and the counts always sum to
//! `N`. A position exactly on a grid line belongs to the cell above the line,
//! where the line is `coord as f32 * cell_size`, the same product
//! [`GridIndex::cell_bounds`] reports. The quotient is corrected by one cell
//! when rounding in `p / cell_size` lands on the wrong side of that product.

use crate::error::GridResult;
use crate::grid::config::validate_shape;

/// Maps positions to cells for one grid shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndex<const D: usize> {
    grid_dim: [u32; D],
    cell_size: [f32; D],
    cell_count: u32,
}

impl<const D: usize> GridIndex<D> {
    /// Builds the index for a grid covering `[0, range)`.
    ///
    /// # Errors
    ///
    /// Fails on zero dimensions, non-positive or non-finite ranges, and cell
    /// counts that overflow `u32`.
    pub fn new(range: [f32; D], grid_dim: [u32; D]) -> GridResult<Self> {
        let cell_count = validate_shape(&range, &grid_dim)?;
        Ok(Self {
            grid_dim,
            cell_size: std::array::from_fn(|axis| range[axis] / grid_dim[axis] as f32),
            cell_count,
        })
    }

    /// Cell count along each axis.
    #[inline]
    #[must_use]
    pub const fn grid_dim(&self) -> [u32; D] {
        self.grid_dim
    }

    /// Cell size along each axis.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> [f32; D] {
        self.cell_size
    }

    /// Total number of cells `G`.
    #[inline]
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Largest cell edge; the neighbor-search radius hint for kernels.
    #[inline]
    #[must_use]
    pub fn cell_h(&self) -> f32 {
        self.cell_size.iter().copied().fold(0.0, f32::max)
    }

    #[inline]
    fn axis_coord(&self, axis: usize, p: f32) -> u32 {
        let size = self.cell_size[axis];
        let last = i64::from(self.grid_dim[axis] - 1);
        // `as i64` saturates and maps NaN to 0.
        let mut cell = ((p / size).floor() as i64).clamp(0, last);
        if cell < last && (cell + 1) as f32 * size <= p {
            cell += 1;
        } else if cell > 0 && cell as f32 * size > p {
            cell -= 1;
        }
        cell as u32
    }

    /// Clamped cell coordinate of a position.
    #[inline]
    #[must_use]
    pub fn cell_coord(&self, position: [f32; D]) -> [u32; D] {
        std::array::from_fn(|axis| self.axis_coord(axis, position[axis]))
    }

    /// Flattens a cell coordinate, x fastest.
    #[inline]
    #[must_use]
    pub fn cell_id(&self, coord: [u32; D]) -> u32 {
        let mut id = 0;
        let mut stride = 1;
        for axis in 0..D {
            debug_assert!(coord[axis] < self.grid_dim[axis], "cell coordinate out of grid");
            id += coord[axis] * stride;
            stride = stride.wrapping_mul(self.grid_dim[axis]);
        }
        id
    }

    /// Cell id of a position.
    #[inline]
    #[must_use]
    pub fn cell_of(&self, position: [f32; D]) -> u32 {
        self.cell_id(self.cell_coord(position))
    }

    /// Unflattens a cell id.
    #[must_use]
    pub fn coord_of(&self, id: u32) -> [u32; D] {
        debug_assert!(id < self.cell_count, "cell id out of grid");
        let mut rest = id;
        std::array::from_fn(|axis| {
            let coord = rest % self.grid_dim[axis];
            rest /= self.grid_dim[axis];
            coord
        })
    }

    /// World-space `(min, max)` corners of a cell.
    #[must_use]
    pub fn cell_bounds(&self, id: u32) -> ([f32; D], [f32; D]) {
        let coord = self.coord_of(id);
        let min = std::array::from_fn(|axis| coord[axis] as f32 * self.cell_size[axis]);
        let max = std::array::from_fn(|axis| (coord[axis] + 1) as f32 * self.cell_size[axis]);
        (min, max)
    }

    /// The 3×3 (3×3×3) block around a cell, clipped to the grid.
    #[inline]
    #[must_use]
    pub fn neighbor_cells(&self, id: u32) -> NeighborCells<D> {
        self.neighbor_cells_within(id, 1)
    }

    /// All cells within `reach` cells of `id` on every axis, clipped to the grid.
    #[must_use]
    pub fn neighbor_cells_within(&self, id: u32, reach: u32) -> NeighborCells<D> {
        let center = self.coord_of(id);
        let lo = std::array::from_fn(|axis| center[axis].saturating_sub(reach));
        let hi = std::array::from_fn(|axis| {
            center[axis]
                .saturating_add(reach)
                .min(self.grid_dim[axis] - 1)
        });
        NeighborCells {
            grid_dim: self.grid_dim,
            lo,
            hi,
            cursor: lo,
            done: false,
        }
    }
}

/// Iterator over the cell ids of a box-shaped stencil, x fastest.
#[derive(Debug, Clone)]
pub struct NeighborCells<const D: usize> {
    grid_dim: [u32; D],
    lo: [u32; D],
    hi: [u32; D],
    cursor: [u32; D],
    done: bool,
}

impl<const D: usize> Iterator for NeighborCells<D> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.done {
            return None;
        }

        let mut id = 0;
        let mut stride = 1;
        for axis in 0..D {
            id += self.cursor[axis] * stride;
            stride = stride.wrapping_mul(self.grid_dim[axis]);
        }

        // Odometer step.
        self.done = true;
        for axis in 0..D {
            if self.cursor[axis] < self.hi[axis] {
                self.cursor[axis] += 1;
                self.done = false;
                break;
            }
            self.cursor[axis] = self.lo[axis];
        }

        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_2x2() -> GridIndex<2> {
        GridIndex::new([4.0, 4.0], [2, 2]).unwrap()
    }

    #[test]
    fn test_row_major_ids() {
        let index = index_2x2();
        assert_eq!(index.cell_of([0.0, 0.0]), 0);
        assert_eq!(index.cell_of([3.0, 0.0]), 1);
        assert_eq!(index.cell_of([0.0, 3.0]), 2);
        assert_eq!(index.cell_of([3.0, 3.0]), 3);
    }

    #[test]
    fn test_grid_line_goes_to_upper_cell() {
        let index = index_2x2();
        assert_eq!(index.cell_coord([2.0, 2.0]), [1, 1]);
        assert_eq!(index.cell_coord([1.999_99, 2.0]), [0, 1]);
        // Same answer every time
        for _ in 0..4 {
            assert_eq!(index.cell_of([2.0, 0.0]), 1);
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        let index = index_2x2();
        assert_eq!(index.cell_coord([-5.0, 100.0]), [0, 1]);
        assert_eq!(index.cell_coord([4.0, 4.0]), [1, 1]);
        assert_eq!(index.cell_coord([f32::INFINITY, f32::NEG_INFINITY]), [1, 0]);
    }

    #[test]
    fn test_nan_goes_to_edge_cell() {
        let index = index_2x2();
        assert_eq!(index.cell_coord([f32::NAN, 3.0]), [0, 1]);
        assert_eq!(index.cell_of([f32::NAN, f32::NAN]), 0);
    }

    #[test]
    fn test_coord_round_trip_3d() {
        let index = GridIndex::new([10.0, 20.0, 30.0], [5, 4, 3]).unwrap();
        assert_eq!(index.cell_count(), 60);
        for id in 0..index.cell_count() {
            assert_eq!(index.cell_id(index.coord_of(id)), id);
        }
        assert_eq!(index.coord_of(2 * 5 + 2 * 20), [0, 2, 2]);
    }

    #[test]
    fn test_cell_h_is_largest_edge() {
        let index = GridIndex::new([128.0, 64.0], [16, 16]).unwrap();
        assert_eq!(index.cell_size(), [8.0, 4.0]);
        assert!((index.cell_h() - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cell_bounds() {
        let index = index_2x2();
        assert_eq!(index.cell_bounds(3), ([2.0, 2.0], [4.0, 4.0]));
        assert_eq!(index.cell_bounds(1), ([2.0, 0.0], [4.0, 2.0]));
    }

    #[test]
    fn test_cell_bounds_agree_with_cell_of() {
        // 10 / 7 is inexact in f32, so some lines sit just off the quotient.
        for (range, dim) in [(10.0f32, 7u32), (1.0, 7), (0.3, 3), (128.0, 12), (1.0, 10)] {
            let index = GridIndex::new([range], [dim]).unwrap();
            for cell in 0..dim {
                let (min, max) = index.cell_bounds(cell);
                assert_eq!(index.cell_of(min), cell, "min of cell {cell}, range {range} / {dim}");
                if cell + 1 < dim {
                    assert_eq!(index.cell_of(max), cell + 1, "max of cell {cell}, range {range} / {dim}");
                }
            }
        }

        let index = GridIndex::new([10.0, 10.0], [7, 7]).unwrap();
        for id in 0..index.cell_count() {
            assert_eq!(index.cell_of(index.cell_bounds(id).0), id);
        }
    }

    #[test]
    fn test_neighbor_cells_2d() {
        let index = GridIndex::new([16.0, 16.0], [4, 4]).unwrap();

        // Corner: 2x2 block
        let corner: Vec<u32> = index.neighbor_cells(0).collect();
        assert_eq!(corner, vec![0, 1, 4, 5]);

        // Interior: full 3x3 block, ascending
        let interior: Vec<u32> = index.neighbor_cells(5).collect();
        assert_eq!(interior, vec![0, 1, 2, 4, 5, 6, 8, 9, 10]);

        // Far corner
        let last: Vec<u32> = index.neighbor_cells(15).collect();
        assert_eq!(last, vec![10, 11, 14, 15]);
    }

    #[test]
    fn test_neighbor_cells_3d() {
        let index = GridIndex::new([3.0, 3.0, 3.0], [3, 3, 3]).unwrap();
        let center = index.cell_id([1, 1, 1]);
        assert_eq!(index.neighbor_cells(center).count(), 27);
        assert_eq!(index.neighbor_cells(0).count(), 8);
    }

    #[test]
    fn test_neighbor_reach() {
        let index = GridIndex::new([8.0], [8]).unwrap();
        let cells: Vec<u32> = index.neighbor_cells_within(4, 2).collect();
        assert_eq!(cells, vec![2, 3, 4, 5, 6]);
        let single: Vec<u32> = index.neighbor_cells_within(4, 0).collect();
        assert_eq!(single, vec![4]);
    }
}
