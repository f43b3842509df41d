//! WGSL kernels for the GPU grid sort.
//!
//! Bindings per kernel (group 0):
//!
//! ```text
//!   clear    0 params  1 counters
//!   count    0 params  1 positions  2 cell_ids (rw)  3 counters
//!   scan     0 params  1 counters   2 offsets (rw)
//!   scatter  0 params  1 cell_ids   2 cursors  3 records_in  4 records_out
//!            5 positions_in  6 positions_out
//! ```
//!
//! Positions are stored as `vec4<f32>`; unused axes have `grid_dim = 1`.
//! Records are copied as `u32` words.

use crate::dispatch::SIMULATION_BLOCK_SIZE;

/// Threads in the single scan workgroup.
pub const SCAN_WORKGROUP_SIZE: u32 = 256;

macro_rules! params_wgsl {
    () => {
        r"
struct Params {
    grid_dim: vec4<u32>,
    cell_size: vec4<f32>,
    entity_count: u32,
    cell_count: u32,
    record_words: u32,
    _pad: u32,
}

@group(0) @binding(0) var<uniform> params: Params;
"
    };
}

/// Uniform block shared by every kernel. Mirrors `Params` in WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridSortParams {
    /// Cells per axis, padded with 1.
    pub grid_dim: [u32; 4],
    /// Cell edge per axis, padded with 1.0.
    pub cell_size: [f32; 4],
    /// `N`.
    pub entity_count: u32,
    /// `G`.
    pub cell_count: u32,
    /// Record size in `u32` words.
    pub record_words: u32,
    /// Keeps the block 16-byte aligned.
    pub _pad: u32,
}

/// WGSL sources of the four grid sort kernels.
#[derive(Debug, Clone, Copy)]
pub struct GridSortShaders;

impl GridSortShaders {
    /// Entry point shared by every kernel.
    pub const ENTRY_POINT: &'static str = "main";

    /// Workgroup size of the per-entity and per-cell kernels.
    pub const WORKGROUP_SIZE: u32 = SIMULATION_BLOCK_SIZE as u32;

    /// Zeroes the per-cell counters.
    pub const CLEAR: &'static str = concat!(
        params_wgsl!(),
        r"
@group(0) @binding(1) var<storage, read_write> counters: array<atomic<u32>>;

@compute @workgroup_size(32)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let c = gid.x;
    if (c >= params.cell_count) {
        return;
    }
    atomicStore(&counters[c], 0u);
}
"
    );

    /// Computes each entity's cell id and bumps that cell's counter.
    pub const COUNT: &'static str = concat!(
        params_wgsl!(),
        r"
@group(0) @binding(1) var<storage, read> positions: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read_write> cell_ids: array<u32>;
@group(0) @binding(3) var<storage, read_write> counters: array<atomic<u32>>;

fn is_nan(p: f32) -> bool {
    return (bitcast<u32>(p) & 0x7fffffffu) > 0x7f800000u;
}

fn axis_coord(p: f32, size: f32, dim: u32) -> u32 {
    if (is_nan(p)) {
        return 0u;
    }
    let last = dim - 1u;
    var c = u32(clamp(floor(p / size), 0.0, f32(last)));
    if (c < last && f32(c + 1u) * size <= p) {
        c = c + 1u;
    } else if (c > 0u && f32(c) * size > p) {
        c = c - 1u;
    }
    return c;
}

@compute @workgroup_size(32)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i >= params.entity_count) {
        return;
    }
    let p = positions[i];
    let x = axis_coord(p.x, params.cell_size.x, params.grid_dim.x);
    let y = axis_coord(p.y, params.cell_size.y, params.grid_dim.y);
    let z = axis_coord(p.z, params.cell_size.z, params.grid_dim.z);
    let id = x + params.grid_dim.x * (y + params.grid_dim.y * z);
    cell_ids[i] = id;
    atomicAdd(&counters[id], 1u);
}
"
    );

    /// Exclusive scan of the counters into the offset table, leaving each
    /// counter set to its cell's start so it can serve as a scatter cursor.
    pub const SCAN: &'static str = concat!(
        params_wgsl!(),
        r"
@group(0) @binding(1) var<storage, read_write> counters: array<atomic<u32>>;
@group(0) @binding(2) var<storage, read_write> offsets: array<u32>;

const SCAN_THREADS: u32 = 256u;

var<workgroup> partial: array<u32, 256>;

@compute @workgroup_size(256)
fn main(@builtin(local_invocation_id) lid: vec3<u32>) {
    let t = lid.x;
    let g = params.cell_count;
    let chunk = (g + SCAN_THREADS - 1u) / SCAN_THREADS;
    let start = min(t * chunk, g);
    let end = min(start + chunk, g);

    var sum = 0u;
    for (var c = start; c < end; c = c + 1u) {
        sum = sum + atomicLoad(&counters[c]);
    }
    partial[t] = sum;
    workgroupBarrier();

    if (t == 0u) {
        var running = 0u;
        for (var k = 0u; k < SCAN_THREADS; k = k + 1u) {
            let s = partial[k];
            partial[k] = running;
            running = running + s;
        }
        offsets[g] = running;
    }
    workgroupBarrier();

    var acc = partial[t];
    for (var c = start; c < end; c = c + 1u) {
        let count = atomicLoad(&counters[c]);
        offsets[c] = acc;
        atomicStore(&counters[c], acc);
        acc = acc + count;
    }
}
"
    );

    /// Claims a slot per entity and copies its record and position there.
    pub const SCATTER: &'static str = concat!(
        params_wgsl!(),
        r"
@group(0) @binding(1) var<storage, read> cell_ids: array<u32>;
@group(0) @binding(2) var<storage, read_write> cursors: array<atomic<u32>>;
@group(0) @binding(3) var<storage, read> records_in: array<u32>;
@group(0) @binding(4) var<storage, read_write> records_out: array<u32>;
@group(0) @binding(5) var<storage, read> positions_in: array<vec4<f32>>;
@group(0) @binding(6) var<storage, read_write> positions_out: array<vec4<f32>>;

@compute @workgroup_size(32)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    if (i >= params.entity_count) {
        return;
    }
    let slot = atomicAdd(&cursors[cell_ids[i]], 1u);
    let w = params.record_words;
    for (var k = 0u; k < w; k = k + 1u) {
        records_out[slot * w + k] = records_in[i * w + k];
    }
    positions_out[slot] = positions_in[i];
}
"
    );

    /// Every kernel as `(label, source)`, in dispatch order.
    #[must_use]
    pub const fn all() -> [(&'static str, &'static str); 4] {
        [
            ("lattice clear", Self::CLEAR),
            ("lattice count", Self::COUNT),
            ("lattice scan", Self::SCAN),
            ("lattice scatter", Self::SCATTER),
        ]
    }
}
