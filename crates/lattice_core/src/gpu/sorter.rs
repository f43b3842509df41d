//! Device-side grid sorter.

use std::marker::PhantomData;

use wgpu::util::DeviceExt;

use crate::entity::GridEntity;
use crate::error::GridError;
use crate::gpu::error::{GpuError, GpuResult};
use crate::gpu::shaders::{GridSortParams, GridSortShaders};
use crate::grid::GridConfig;

/// Per-dimension workgroup limit guaranteed by `wgpu::Limits::default()`.
const MAX_WORKGROUPS: u32 = 65_535;

/// Grid counting sort running on a `wgpu` device.
///
/// Records and positions live in two device buffers each; every
/// [`GpuGridSorter::sort`] scatters from the current pair into the other and
/// flips which pair is current.
pub struct GpuGridSorter<T: GridEntity<D>, const D: usize> {
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: GridConfig<D>,
    cell_count: u32,
    record_words: u32,

    records: [wgpu::Buffer; 2],
    positions: [wgpu::Buffer; 2],
    offsets: wgpu::Buffer,

    clear: wgpu::ComputePipeline,
    count: wgpu::ComputePipeline,
    scan: wgpu::ComputePipeline,
    scatter: wgpu::ComputePipeline,

    clear_group: wgpu::BindGroup,
    count_groups: [wgpu::BindGroup; 2],
    scan_group: wgpu::BindGroup,
    scatter_groups: [wgpu::BindGroup; 2],

    current: usize,
    frame: u64,
    _marker: PhantomData<T>,
}

impl<T: GridEntity<D>, const D: usize> GpuGridSorter<T, D> {
    /// Requests a high-performance adapter and device, then builds the sorter.
    ///
    /// # Errors
    ///
    /// [`GpuError::NoAdapter`] / [`GpuError::RequestDevice`] when no device is
    /// available, plus everything [`GpuGridSorter::from_device`] returns.
    pub fn new(config: GridConfig<D>) -> GpuResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        tracing::info!(adapter = %adapter.get_info().name, "GPU grid sorter adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lattice device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|e| GpuError::RequestDevice(e.to_string()))?;

        Self::from_device(device, queue, config)
    }

    /// Builds the sorter on an existing device.
    ///
    /// # Errors
    ///
    /// - [`GpuError::Grid`] if the configuration is invalid
    /// - [`GpuError::UnsupportedDimension`] if `D > 3`
    /// - [`GpuError::UnsupportedRecord`] if `T` is not a whole number of `u32` words
    /// - [`GpuError::DispatchTooLarge`] if `N` or `G` needs too many workgroups
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: GridConfig<D>,
    ) -> GpuResult<Self> {
        let cell_count = config.validate()?;
        if D > 3 {
            return Err(GpuError::UnsupportedDimension(D));
        }
        let record_size = std::mem::size_of::<T>();
        if record_size == 0 || record_size % 4 != 0 {
            return Err(GpuError::UnsupportedRecord(record_size));
        }
        for items in [config.entity_count, cell_count as usize] {
            if workgroups(items) > MAX_WORKGROUPS as usize {
                return Err(GpuError::DispatchTooLarge { items });
            }
        }

        let n = config.entity_count as u64;
        let g = u64::from(cell_count);
        let record_words = (record_size / 4) as u32;

        let cell_size = config.cell_size();
        let mut params = GridSortParams {
            grid_dim: [1; 4],
            cell_size: [1.0; 4],
            entity_count: config.entity_count as u32,
            cell_count,
            record_words,
            _pad: 0,
        };
        params.grid_dim[..D].copy_from_slice(&config.grid_dim);
        params.cell_size[..D].copy_from_slice(&cell_size);

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lattice params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let storage = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let record_bytes = n * u64::from(record_words) * 4;
        let position_bytes = n * 16;
        let records = [
            storage("lattice records a", record_bytes),
            storage("lattice records b", record_bytes),
        ];
        let positions = [
            storage("lattice positions a", position_bytes),
            storage("lattice positions b", position_bytes),
        ];
        let cell_ids = storage("lattice cell ids", n * 4);
        let counters = storage("lattice counters", g * 4);
        let offsets = storage("lattice offsets", (g + 1) * 4);

        let [clear, count, scan, scatter] =
            GridSortShaders::all().map(|(label, source)| create_pipeline(&device, label, source));

        let clear_group = bind_group(&device, &clear, "lattice clear", &[&params_buffer, &counters]);
        let count_groups = [0, 1].map(|cur| {
            bind_group(
                &device,
                &count,
                "lattice count",
                &[&params_buffer, &positions[cur], &cell_ids, &counters],
            )
        });
        let scan_group = bind_group(&device, &scan, "lattice scan", &[&params_buffer, &counters, &offsets]);
        let scatter_groups = [0, 1].map(|cur| {
            bind_group(
                &device,
                &scatter,
                "lattice scatter",
                &[
                    &params_buffer,
                    &cell_ids,
                    &counters,
                    &records[cur],
                    &records[cur ^ 1],
                    &positions[cur],
                    &positions[cur ^ 1],
                ],
            )
        });

        tracing::info!(
            entities = config.entity_count,
            cells = cell_count,
            record_words,
            "GPU grid sorter created"
        );

        Ok(Self {
            device,
            queue,
            config,
            cell_count,
            record_words,
            records,
            positions,
            offsets,
            clear,
            count,
            scan,
            scatter,
            clear_group,
            count_groups,
            scan_group,
            scatter_groups,
            current: 0,
            frame: 0,
            _marker: PhantomData,
        })
    }

    /// Writes `entities` into the current record buffer.
    ///
    /// # Errors
    ///
    /// [`GridError::EntityCountMismatch`] (as [`GpuError::Grid`]) if the
    /// length differs from `N`.
    pub fn upload(&mut self, entities: &[T]) -> GpuResult<()> {
        let expected = self.config.entity_count;
        if entities.len() != expected {
            return Err(GridError::EntityCountMismatch {
                expected,
                actual: entities.len(),
            }
            .into());
        }

        let positions: Vec<[f32; 4]> = entities
            .iter()
            .map(|entity| {
                let p = entity.grid_position();
                let mut padded = [0.0; 4];
                padded[..D].copy_from_slice(&p);
                padded
            })
            .collect();

        self.queue
            .write_buffer(&self.records[self.current], 0, bytemuck::cast_slice(entities));
        self.queue
            .write_buffer(&self.positions[self.current], 0, bytemuck::cast_slice(&positions));
        Ok(())
    }

    /// Encodes and submits clear, count, scan and scatter in one command buffer.
    pub fn sort(&mut self) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lattice grid sort"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("lattice grid sort"),
                timestamp_writes: None,
            });

            pass.set_pipeline(&self.clear);
            pass.set_bind_group(0, &self.clear_group, &[]);
            pass.dispatch_workgroups(workgroups(self.cell_count as usize) as u32, 1, 1);

            pass.set_pipeline(&self.count);
            pass.set_bind_group(0, &self.count_groups[self.current], &[]);
            pass.dispatch_workgroups(workgroups(self.config.entity_count) as u32, 1, 1);

            pass.set_pipeline(&self.scan);
            pass.set_bind_group(0, &self.scan_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);

            pass.set_pipeline(&self.scatter);
            pass.set_bind_group(0, &self.scatter_groups[self.current], &[]);
            pass.dispatch_workgroups(workgroups(self.config.entity_count) as u32, 1, 1);
        }

        self.queue.submit(Some(encoder.finish()));
        self.current ^= 1;
        self.frame += 1;
        tracing::debug!(frame = self.frame, "GPU grid sort submitted");
    }

    /// Reads back the offset table of the last sort (`G + 1` entries).
    ///
    /// # Errors
    ///
    /// [`GpuError::Readback`] if mapping fails.
    pub fn read_offsets(&self) -> GpuResult<Vec<u32>> {
        let bytes = self.read_buffer(&self.offsets, (u64::from(self.cell_count) + 1) * 4)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Reads back the current (sorted) record buffer.
    ///
    /// # Errors
    ///
    /// [`GpuError::Readback`] if mapping fails.
    pub fn read_sorted(&self) -> GpuResult<Vec<T>> {
        let size = self.config.entity_count as u64 * u64::from(self.record_words) * 4;
        let bytes = self.read_buffer(&self.records[self.current], size)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Entity count `N`.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.config.entity_count
    }

    /// Cell count `G`.
    #[inline]
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Number of submitted sorts.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    fn read_buffer(&self, source: &wgpu::Buffer, size: u64) -> GpuResult<Vec<u8>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lattice readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lattice readback"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = crossbeam_channel::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }
}

impl<T: GridEntity<D>, const D: usize> std::fmt::Debug for GpuGridSorter<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuGridSorter")
            .field("config", &self.config)
            .field("record_words", &self.record_words)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

#[inline]
fn workgroups(items: usize) -> usize {
    items.div_ceil(GridSortShaders::WORKGROUP_SIZE as usize)
}

fn create_pipeline(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: None,
        module: &module,
        entry_point: GridSortShaders::ENTRY_POINT,
    })
}

fn bind_group(
    device: &wgpu::Device,
    pipeline: &wgpu::ComputePipeline,
    label: &str,
    buffers: &[&wgpu::Buffer],
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry<'_>> = buffers
        .iter()
        .enumerate()
        .map(|(binding, buffer)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: buffer.as_entire_binding(),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &pipeline.get_bind_group_layout(0),
        entries: &entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridIndex, GridOptimizer};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn sorter_or_skip<T: GridEntity<D>, const D: usize>(
        config: GridConfig<D>,
    ) -> Option<GpuGridSorter<T, D>> {
        match GpuGridSorter::new(config) {
            Ok(sorter) => Some(sorter),
            Err(GpuError::NoAdapter | GpuError::RequestDevice(_)) => None,
            Err(e) => panic!("unexpected GPU error: {e}"),
        }
    }

    #[test]
    fn test_gpu_offsets_match_cpu() {
        let config = GridConfig::new(4096, [128.0, 128.0], [16, 16]);
        let Some(mut gpu) = sorter_or_skip::<[f32; 2], 2>(config) else {
            return;
        };

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut positions: Vec<[f32; 2]> = (0..4096)
            .map(|_| [rng.gen_range(1.0..128.0), rng.gen_range(1.0..128.0)])
            .collect();

        gpu.upload(&positions).unwrap();
        gpu.sort();
        let gpu_offsets = gpu.read_offsets().unwrap();
        let gpu_sorted = gpu.read_sorted().unwrap();

        let mut cpu = GridOptimizer::new(4096, [128.0, 128.0], [16, 16]).unwrap();
        cpu.sort(&mut positions).unwrap();
        assert_eq!(gpu_offsets, cpu.offset_table());

        let index = GridIndex::new([128.0, 128.0], [16, 16]).unwrap();
        for cell in 0..index.cell_count() as usize {
            let range = gpu_offsets[cell] as usize..gpu_offsets[cell + 1] as usize;
            for p in &gpu_sorted[range] {
                assert_eq!(index.cell_of(*p) as usize, cell);
            }
        }
    }

    #[test]
    fn test_gpu_resort_keeps_offsets() {
        let config = GridConfig::new(64, [8.0, 8.0, 8.0], [2, 2, 2]);
        let Some(mut gpu) = sorter_or_skip::<[f32; 3], 3>(config) else {
            return;
        };
        let positions: Vec<[f32; 3]> = (0..64)
            .map(|i| [(i % 8) as f32, ((i / 8) % 8) as f32, (i % 5) as f32])
            .collect();

        gpu.upload(&positions).unwrap();
        gpu.sort();
        let first = gpu.read_offsets().unwrap();
        gpu.sort();
        assert_eq!(gpu.read_offsets().unwrap(), first);
        assert_eq!(gpu.frame(), 2);
    }

    #[test]
    fn test_gpu_grid_lines_and_nan_match_cpu() {
        let config = GridConfig::new(16, [10.0, 10.0], [7, 7]);
        let Some(mut gpu) = sorter_or_skip::<[f32; 2], 2>(config) else {
            return;
        };
        let index = GridIndex::new([10.0, 10.0], [7, 7]).unwrap();
        let mut positions: Vec<[f32; 2]> = (0..14)
            .map(|i| index.cell_bounds(i * 3).0)
            .collect();
        positions.push([f32::NAN, 5.0]);
        positions.push([f32::INFINITY, f32::NEG_INFINITY]);

        gpu.upload(&positions).unwrap();
        gpu.sort();
        let gpu_offsets = gpu.read_offsets().unwrap();

        let mut cpu = GridOptimizer::new(16, [10.0, 10.0], [7, 7]).unwrap();
        cpu.sort(&mut positions).unwrap();
        assert_eq!(gpu_offsets, cpu.offset_table());
    }

    #[test]
    fn test_upload_rejects_wrong_length() {
        let config = GridConfig::new(8, [4.0, 4.0], [2, 2]);
        let Some(mut gpu) = sorter_or_skip::<[f32; 2], 2>(config) else {
            return;
        };
        let result = gpu.upload(&[[0.0, 0.0]; 3]);
        assert!(matches!(
            result,
            Err(GpuError::Grid(GridError::EntityCountMismatch { expected: 8, actual: 3 }))
        ));
    }
}
