//! # Dispatch Backends
//!
//! The grid passes are written as kernels over an index space, the same shape
//! as a compute shader dispatch. This module decides who runs them.
//!
//! ```text
//!   kernel(i) for i in 0..N
//!          │
//!          ├── Serial    → plain loop, deterministic slot order
//!          └── Parallel  → rayon work-stealing, blocks of 32 items
//! ```
//!
//! Every dispatch returns only after all work items have finished. That return
//! is the barrier between dependent passes (count → scan → scatter).

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Minimum number of work items handed to one rayon task.
///
/// Matches the workgroup size of the WGSL kernels.
pub const SIMULATION_BLOCK_SIZE: usize = 32;

/// Backend selector as it appears in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Single-threaded loops.
    Serial,
    /// Rayon data-parallel iterators.
    #[default]
    Parallel,
}

/// Executes data-parallel kernels.
#[derive(Debug, Clone)]
pub enum ExecutionBackend {
    /// Runs every kernel as a plain loop on the calling thread.
    Serial,
    /// Runs kernels on rayon, in a dedicated pool when one is given.
    Parallel {
        /// Dedicated pool, or `None` for the rayon global pool.
        pool: Option<Arc<rayon::ThreadPool>>,
    },
}

impl Default for ExecutionBackend {
    fn default() -> Self {
        Self::parallel()
    }
}

impl ExecutionBackend {
    /// Single-threaded backend.
    #[must_use]
    pub const fn serial() -> Self {
        Self::Serial
    }

    /// Parallel backend on the rayon global pool.
    #[must_use]
    pub const fn parallel() -> Self {
        Self::Parallel { pool: None }
    }

    /// Parallel backend on a dedicated pool of `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ThreadPool`] if rayon cannot spawn the pool.
    pub fn parallel_with_threads(threads: usize) -> GridResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lattice-worker-{i}"))
            .build()
            .map_err(|e| GridError::ThreadPool(e.to_string()))?;
        Ok(Self::Parallel {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Builds a backend from its configuration form.
    ///
    /// `threads == 0` selects the rayon global pool.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ThreadPool`] if a dedicated pool cannot be built.
    pub fn from_kind(kind: BackendKind, threads: usize) -> GridResult<Self> {
        match kind {
            BackendKind::Serial => Ok(Self::Serial),
            BackendKind::Parallel if threads == 0 => Ok(Self::parallel()),
            BackendKind::Parallel => Self::parallel_with_threads(threads),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Parallel { .. } => "parallel",
        }
    }

    /// Number of threads kernels may run on.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Parallel { pool: Some(pool) } => pool.current_num_threads(),
            Self::Parallel { pool: None } => rayon::current_num_threads(),
        }
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match self {
            Self::Parallel { pool: Some(pool) } => pool.install(op),
            _ => op(),
        }
    }

    /// Runs `kernel(i)` for every `i` in `0..len`.
    pub fn for_each_index<F>(&self, len: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        match self {
            Self::Serial => (0..len).for_each(kernel),
            Self::Parallel { .. } => self.install(|| {
                (0..len)
                    .into_par_iter()
                    .with_min_len(SIMULATION_BLOCK_SIZE)
                    .for_each(|i| kernel(i));
            }),
        }
    }

    /// Runs `kernel(i, &mut items[i])` for every element.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        match self {
            Self::Serial => items
                .iter_mut()
                .enumerate()
                .for_each(|(i, item)| kernel(i, item)),
            Self::Parallel { .. } => self.install(|| {
                items
                    .par_iter_mut()
                    .with_min_len(SIMULATION_BLOCK_SIZE)
                    .enumerate()
                    .for_each(|(i, item)| kernel(i, item));
            }),
        }
    }

    /// Runs `kernel(chunk_index, chunk)` over `chunk_len`-sized chunks.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_len` is zero.
    pub fn for_each_chunk_mut<T, F>(&self, items: &mut [T], chunk_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        assert!(chunk_len > 0, "chunk length must be greater than zero");
        match self {
            Self::Serial => items
                .chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(i, chunk)| kernel(i, chunk)),
            Self::Parallel { .. } => self.install(|| {
                items
                    .par_chunks_mut(chunk_len)
                    .enumerate()
                    .for_each(|(i, chunk)| kernel(i, chunk));
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn backends() -> Vec<ExecutionBackend> {
        vec![
            ExecutionBackend::serial(),
            ExecutionBackend::parallel(),
            ExecutionBackend::parallel_with_threads(2).unwrap(),
        ]
    }

    #[test]
    fn test_for_each_index_visits_every_item_once() {
        for backend in backends() {
            let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
            backend.for_each_index(hits.len(), |i| {
                hits[i].fetch_add(1, Ordering::Relaxed);
            });
            assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1), "{}", backend.name());
        }
    }

    #[test]
    fn test_for_each_mut_passes_matching_index() {
        for backend in backends() {
            let mut items = vec![0usize; 777];
            backend.for_each_mut(&mut items, |i, item| *item = i * 2);
            assert!(items.iter().enumerate().all(|(i, v)| *v == i * 2));
        }
    }

    #[test]
    fn test_for_each_chunk_mut_covers_tail() {
        for backend in backends() {
            let mut items = vec![0usize; 10];
            backend.for_each_chunk_mut(&mut items, 4, |chunk, values| {
                for v in values.iter_mut() {
                    *v = chunk;
                }
            });
            assert_eq!(items, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2]);
        }
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(ExecutionBackend::from_kind(BackendKind::Serial, 8).unwrap().thread_count(), 1);
        let pooled = ExecutionBackend::from_kind(BackendKind::Parallel, 3).unwrap();
        assert_eq!(pooled.thread_count(), 3);
        assert_eq!(pooled.name(), "parallel");
    }

    #[test]
    fn test_empty_dispatch_is_noop() {
        for backend in backends() {
            backend.for_each_index(0, |_| panic!("no work items"));
            backend.for_each_mut(&mut [] as &mut [u32], |_, _| panic!("no work items"));
        }
    }
}
