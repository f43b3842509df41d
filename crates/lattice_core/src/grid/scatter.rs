//! # Scatter / Rearrange Pass
//!
//! Uses the offset table to place every entity in its cell's slice of the
//! sorted buffer.
//!
//! ```text
//!   init     cursor[c] = offset[c]
//!   claim    slot = cursor[cell_ids[i]]++         (atomic, one per entity)
//!            slots[slot] = i
//!   ── barrier ──
//!   gather   entries[s] = (cell, slots[s])
//!            sorted[s]  = entities[slots[s]]
//! ```
//!
//! The claim step hands out each slot of `[offset[c], offset[c+1])` exactly
//! once because the cursor for `c` is bumped exactly `count[c]` times. The copy
//! is done as a gather over output slots, so every write targets a distinct
//! element owned by exactly one work item. Slot order inside a cell follows
//! claim order and is not stable on the parallel backend.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::dispatch::ExecutionBackend;
use crate::entity::GridEntry;

/// Buffers the scatter pass writes into.
pub struct ScatterTargets<'a, T> {
    /// Per-cell write cursors, one per cell (reinitialised here).
    pub cursors: &'a mut [AtomicU32],
    /// Slot → source index table, one per entity.
    pub slots: &'a [AtomicU32],
    /// Sorted (cell, source index) pairs, one per entity.
    pub entries: &'a mut [GridEntry],
    /// Sorted entity records, one per entity.
    pub sorted: &'a mut [T],
}

/// Runs the scatter pass.
///
/// `offsets` is the table produced by the scan (`G + 1` entries, last one
/// equal to `entities.len()`).
///
/// # Panics
///
/// Panics if buffer lengths disagree with the entity or cell counts.
pub fn scatter_pass<T>(
    backend: &ExecutionBackend,
    entities: &[T],
    cell_ids: &[u32],
    offsets: &[u32],
    targets: ScatterTargets<'_, T>,
) where
    T: Copy + Send + Sync,
{
    let ScatterTargets {
        cursors,
        slots,
        entries,
        sorted,
    } = targets;
    let n = entities.len();
    assert_eq!(cell_ids.len(), n, "cell id buffer must match entity count");
    assert_eq!(offsets.len(), cursors.len() + 1, "offset table must hold G + 1 entries");
    assert_eq!(slots.len(), n, "slot table must match entity count");
    assert_eq!(entries.len(), n, "entry buffer must match entity count");
    assert_eq!(sorted.len(), n, "sorted buffer must match entity count");
    assert_eq!(offsets[cursors.len()] as usize, n, "offset table total must equal N");

    backend.for_each_mut(cursors, |c, cursor| *cursor.get_mut() = offsets[c]);

    let cursors = &*cursors;
    backend.for_each_index(n, |i| {
        let cell = cell_ids[i] as usize;
        let slot = cursors[cell].fetch_add(1, Ordering::Relaxed);
        debug_assert!(slot < offsets[cell + 1], "cell {cell} overflowed its range");
        slots[slot as usize].store(i as u32, Ordering::Relaxed);
    });

    backend.for_each_mut(entries, |slot, entry| {
        let source = slots[slot].load(Ordering::Relaxed);
        *entry = GridEntry::new(cell_ids[source as usize], source);
    });

    let entries = &*entries;
    backend.for_each_mut(sorted, |slot, out| {
        *out = entities[entries[slot].index as usize];
    });
}
