//! Particle record.

use bytemuck::{Pod, Zeroable};
use lattice_core::GridEntity;

/// White, the color of a particle that is neither displayed nor a neighbor.
pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
/// Color of the displayed particle.
pub const RED: [f32; 3] = [1.0, 0.0, 0.0];
/// Color of particles in the displayed particle's neighbor block.
pub const GREEN: [f32; 3] = [0.0, 1.0, 0.0];

/// A 2D particle: position plus display color.
///
/// Layout is fixed (`repr(C)`, 20 bytes) so the buffer can be handed to a
/// renderer or the GPU sorter as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// World position.
    pub pos: [f32; 2],
    /// RGB color.
    pub color: [f32; 3],
}

impl Particle {
    /// A white particle at `pos`.
    #[inline]
    #[must_use]
    pub const fn new(pos: [f32; 2]) -> Self {
        Self { pos, color: WHITE }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new([0.0, 0.0])
    }
}

impl GridEntity<2> for Particle {
    #[inline]
    fn grid_position(&self) -> [f32; 2] {
        self.pos
    }
}
