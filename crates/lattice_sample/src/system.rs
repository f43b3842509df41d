//! # Particle System
//!
//! The frame loop of the nearest neighbor sample.
//!
//! ```text
//!   start    seed N particles in [1, range) ──► DoubleBuffer, GridOptimizer
//!   update   sort(read) ──► highlight(read ▸ write) ──► swap
//!   destroy  release the optimizer (idempotent, also on Drop)
//! ```

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lattice_core::{DoubleBuffer, ExecutionBackend, GridOptimizer2D, SortStats};

use crate::config::SampleConfig;
use crate::error::SampleResult;
use crate::kernel::highlight_neighbors;
use crate::particle::Particle;

/// Per-frame statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 1.
    pub frame: u64,
    /// Grid sort statistics.
    pub sort: SortStats,
    /// Particles in the displayed particle's 3x3 block.
    pub highlighted: usize,
    /// Time spent in the highlight kernel.
    pub kernel_time: Duration,
}

/// Double-buffered particles plus the grid that sorts them every frame.
pub struct ParticleSystem {
    particles: DoubleBuffer<Particle>,
    grid: GridOptimizer2D<Particle>,
    backend: ExecutionBackend,
    display_slot: usize,
    frame: u64,
}

impl ParticleSystem {
    /// Validates `config`, seeds the particles and builds the grid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SampleError::Config`] for an invalid configuration
    /// and [`crate::SampleError::Grid`] if the backend cannot be built.
    pub fn start(config: &SampleConfig) -> SampleResult<Self> {
        config.validate()?;
        let backend = config.backend.build()?;
        let count = config.particle_count();

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let initial: Vec<Particle> = (0..count)
            .map(|_| {
                Particle::new([
                    rng.gen_range(1.0..config.range[0].max(1.0 + f32::EPSILON)),
                    rng.gen_range(1.0..config.range[1].max(1.0 + f32::EPSILON)),
                ])
            })
            .collect();

        let grid = GridOptimizer2D::from_config(config.grid_config(), backend.clone())?;

        tracing::info!(
            particles = count,
            grid_dim = ?config.grid_dim,
            backend = backend.name(),
            "particle system started"
        );

        Ok(Self {
            particles: DoubleBuffer::new(initial),
            grid,
            backend,
            display_slot: config.display_slot(),
            frame: 0,
        })
    }

    /// Runs one frame: grid sort, highlight kernel, buffer swap.
    ///
    /// # Errors
    ///
    /// Propagates grid sort errors.
    ///
    /// # Panics
    ///
    /// Panics if called after [`ParticleSystem::destroy`].
    pub fn update(&mut self) -> SampleResult<FrameStats> {
        let sort = self.grid.sort(self.particles.read_vec_mut())?;

        let start = Instant::now();
        let (read, write) = self.particles.split_mut();
        let view = self.grid.view(read);
        let highlighted = highlight_neighbors(&self.backend, &view, self.display_slot, write);
        let kernel_time = start.elapsed();

        self.particles.swap();
        self.frame += 1;

        let stats = FrameStats {
            frame: self.frame,
            sort,
            highlighted,
            kernel_time,
        };
        tracing::debug!(
            frame = stats.frame,
            highlighted,
            sort_us = sort.total_time().as_micros() as u64,
            kernel_us = kernel_time.as_micros() as u64,
            "frame"
        );
        Ok(stats)
    }

    /// Current particles (the buffer the last frame wrote).
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &[Particle] {
        self.particles.read()
    }

    /// Number of particles.
    #[inline]
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Neighbor search radius hint (largest cell edge).
    ///
    /// # Panics
    ///
    /// Panics after [`ParticleSystem::destroy`], like [`ParticleSystem::grid_dim`].
    #[inline]
    #[must_use]
    pub fn grid_h(&self) -> f32 {
        self.grid.cell_h()
    }

    /// Cells per axis.
    #[inline]
    #[must_use]
    pub fn grid_dim(&self) -> [u32; 2] {
        self.grid.grid_dim()
    }

    /// Sorted slot of the highlighted particle.
    #[inline]
    #[must_use]
    pub const fn display_slot(&self) -> usize {
        self.display_slot
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether [`ParticleSystem::destroy`] has run.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.grid.is_released()
    }

    /// Releases the grid buffers. Safe to call more than once.
    pub fn destroy(&mut self) {
        if !self.grid.is_released() {
            tracing::info!(frames = self.frame, "particle system destroyed");
        }
        self.grid.release();
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("particles", &self.particles.len())
            .field("grid", &self.grid)
            .field("frame", &self.frame)
            .finish()
    }
}
