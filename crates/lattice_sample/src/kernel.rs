//! # Neighbor Highlight Kernel
//!
//! Reads the sorted frame, writes the next one:
//!
//! ```text
//!   pass 1 (per particle)   write[i] = { pos: read[i].pos, color: WHITE }
//!   pass 2 (3x3 block)      for cell in neighbor_cells(cell_of(read[disp]))
//!                               write[offset[cell]..offset[cell+1]].color = GREEN
//!   pass 3                  write[disp].color = RED
//! ```
//!
//! Pass 2 only touches the slices named by the offset table, so its cost is
//! the block population rather than `N`.

use lattice_core::{ExecutionBackend, GridView};

use crate::particle::{Particle, GREEN, RED, WHITE};

/// Runs the kernel and returns how many particles share the displayed
/// particle's 3x3 block (the displayed particle included).
///
/// # Panics
///
/// Panics if `write` and the view's buffer differ in length or
/// `display_slot` is out of range.
pub fn highlight_neighbors(
    backend: &ExecutionBackend,
    view: &GridView<'_, Particle, 2>,
    display_slot: usize,
    write: &mut [Particle],
) -> usize {
    let read = view.entities();
    assert_eq!(read.len(), write.len(), "read and write buffers differ in length");

    backend.for_each_mut(write, |i, out| {
        *out = Particle {
            pos: read[i].pos,
            color: WHITE,
        };
    });

    let display_cell = view.index().cell_of(read[display_slot].pos);
    let mut highlighted = 0;
    for cell in view.neighbor_cells(display_cell) {
        let range = view.cell_range(cell);
        highlighted += range.len();
        for particle in &mut write[range] {
            particle.color = GREEN;
        }
    }
    write[display_slot].color = RED;

    highlighted
}
