//! # Grid Entities
//!
//! The grid sort moves caller-defined records around without looking inside
//! them, except for one thing: the position used for bucketing.

use bytemuck::{Pod, Zeroable};

/// A fixed-layout record that can be bucketed into a `D`-dimensional grid.
///
/// `Pod` pins the layout for the lifetime of an optimizer and lets the GPU
/// path upload records byte for byte.
///
/// # Example
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use lattice_core::GridEntity;
///
/// #[repr(C)]
/// #[derive(Clone, Copy, Pod, Zeroable)]
/// struct Boid {
///     pos: [f32; 2],
///     vel: [f32; 2],
/// }
///
/// impl GridEntity<2> for Boid {
///     fn grid_position(&self) -> [f32; 2] {
///         self.pos
///     }
/// }
/// ```
pub trait GridEntity<const D: usize>: Pod + Send + Sync {
    /// Position used to pick the entity's cell.
    fn grid_position(&self) -> [f32; D];
}

impl GridEntity<2> for [f32; 2] {
    #[inline]
    fn grid_position(&self) -> [f32; 2] {
        *self
    }
}

impl GridEntity<3> for [f32; 3] {
    #[inline]
    fn grid_position(&self) -> [f32; 3] {
        *self
    }
}

/// One (cell, entity) pairing produced by a sort.
///
/// After a sort, entry `i` describes sorted slot `i`: the cell it belongs to
/// and the index the entity had in the unsorted buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct GridEntry {
    /// Cell id in `[0, G)`.
    pub cell: u32,
    /// Pre-sort entity index in `[0, N)`.
    pub index: u32,
}

impl GridEntry {
    /// Creates an entry.
    #[inline]
    #[must_use]
    pub const fn new(cell: u32, index: u32) -> Self {
        Self { cell, index }
    }
}
