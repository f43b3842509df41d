//! # Exclusive Prefix Sum
//!
//! Turns per-cell counts into the cell offset table.
//!
//! Two-level blocked scan, integer exact:
//!
//! ```text
//!   counts   [ c0 .. c255 | c256 .. c511 | ... ]
//!   1. block summaries (parallel)   sum, occupied, max per block
//!   2. exclusive scan of sums       0, s0, s0+s1, ...
//!   3. local scan per block (parallel), seeded with 2.
//!   offsets  [ 0, c0, c0+c1, ..., N ]          (len G + 1)
//! ```
//!
//! The block pass already touches every count, so it also records how many
//! cells are occupied and the largest count.

use crate::dispatch::ExecutionBackend;

/// Number of cells handled by one scan work item.
pub const SCAN_BLOCK_SIZE: usize = 256;

/// Workspace length needed to scan `len` counts.
#[inline]
#[must_use]
pub const fn scan_block_count(len: usize) -> usize {
    len.div_ceil(SCAN_BLOCK_SIZE)
}

/// Totals gathered while scanning a run of counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountSummary {
    /// Sum of the counts.
    pub total: u32,
    /// Counts above zero.
    pub occupied: u32,
    /// Largest count.
    pub max: u32,
}

impl CountSummary {
    fn of(counts: &[u32]) -> Self {
        counts.iter().fold(Self::default(), |acc, &c| Self {
            total: acc.total + c,
            occupied: acc.occupied + u32::from(c > 0),
            max: acc.max.max(c),
        })
    }
}

/// Exclusive prefix sum of `counts` into `offsets`.
///
/// On return `offsets[0] == 0`, `offsets[i + 1] == offsets[i] + counts[i]`
/// and `offsets[counts.len()]` is the total. The returned summary covers all
/// of `counts`. `blocks` is scratch; its contents on return are unspecified.
///
/// # Panics
///
/// Panics if `offsets.len() != counts.len() + 1` or if `blocks` is not
/// [`scan_block_count`] long.
pub fn exclusive_scan(
    backend: &ExecutionBackend,
    counts: &[u32],
    offsets: &mut [u32],
    blocks: &mut [CountSummary],
) -> CountSummary {
    assert_eq!(offsets.len(), counts.len() + 1, "offset table must hold len + 1 entries");
    assert_eq!(
        blocks.len(),
        scan_block_count(counts.len()),
        "scan workspace has the wrong length"
    );

    backend.for_each_mut(blocks, |block, summary| {
        let start = block * SCAN_BLOCK_SIZE;
        let end = (start + SCAN_BLOCK_SIZE).min(counts.len());
        *summary = CountSummary::of(&counts[start..end]);
    });

    // G / 256 entries: cheaper serially than another dispatch.
    // Each block's `total` becomes its exclusive base.
    let mut overall = CountSummary::default();
    for summary in blocks.iter_mut() {
        let block = *summary;
        summary.total = overall.total;
        overall.total += block.total;
        overall.occupied += block.occupied;
        overall.max = overall.max.max(block.max);
    }

    let blocks = &*blocks;
    let (body, tail) = offsets.split_at_mut(counts.len());
    backend.for_each_chunk_mut(body, SCAN_BLOCK_SIZE, |block, chunk| {
        let base = block * SCAN_BLOCK_SIZE;
        let mut acc = blocks[block].total;
        for (j, slot) in chunk.iter_mut().enumerate() {
            *slot = acc;
            acc += counts[base + j];
        }
    });
    tail[0] = overall.total;

    overall
}
