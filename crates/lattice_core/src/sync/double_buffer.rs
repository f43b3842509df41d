//! # Double-Buffered Entity Storage
//!
//! ## Architecture
//!
//! ```text
//!          ┌───────────────────────────────┐
//!          │         DoubleBuffer          │
//!          │                               │
//!          │  ┌──────────┐  ┌──────────┐   │
//!          │  │ Buffer 0 │  │ Buffer 1 │   │
//!          │  └────┬─────┘  └────┬─────┘   │
//!          │       │             │         │
//!          │  ┌────┴─────────────┴────┐    │
//!          │  │   read index (0/1)    │    │
//!          │  └───────────────────────┘    │
//!          └───────────────────────────────┘
//!                       │
//!        ┌──────────────┼──────────────┐
//!        ▼              ▼              ▼
//!   read_vec_mut     split_mut        swap
//!   (grid sort)   (read ▸ write)   (end of frame)
//! ```
//!
//! Both buffers always hold the same number of entities.

/// Two equally sized entity buffers with a read/write role flip.
///
/// ## Usage
///
/// ```rust
/// use lattice_core::DoubleBuffer;
///
/// let mut buffers = DoubleBuffer::new(vec![1u32, 2, 3]);
///
/// let (read, write) = buffers.split_mut();
/// for (dst, src) in write.iter_mut().zip(read) {
///     *dst = src * 10;
/// }
/// buffers.swap();
///
/// assert_eq!(buffers.read(), &[10, 20, 30]);
/// assert_eq!(buffers.frame_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    buffers: [Vec<T>; 2],
    /// Index of the current read buffer (0 or 1).
    /// Write buffer is always `read_index ^ 1`.
    read_index: usize,
    frame_count: u64,
}

impl<T: Clone> DoubleBuffer<T> {
    /// Creates both buffers from the same initial contents.
    #[must_use]
    pub fn new(initial: Vec<T>) -> Self {
        let copy = initial.clone();
        Self::from_parts(initial, copy)
    }
}

impl<T> DoubleBuffer<T> {
    /// Creates a double buffer with `read` as the initial read buffer.
    ///
    /// # Panics
    ///
    /// Panics if the two buffers differ in length.
    #[must_use]
    pub fn from_parts(read: Vec<T>, write: Vec<T>) -> Self {
        assert_eq!(read.len(), write.len(), "double buffer halves must match in length");
        Self {
            buffers: [read, write],
            read_index: 0,
            frame_count: 0,
        }
    }

    /// Entities per buffer.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    /// Whether the buffers are empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    /// Current read buffer.
    #[inline]
    #[must_use]
    pub fn read(&self) -> &[T] {
        &self.buffers[self.read_index]
    }

    /// Current read buffer as a `Vec`, for in-place reordering.
    ///
    /// Callers must not change its length.
    #[inline]
    pub fn read_vec_mut(&mut self) -> &mut Vec<T> {
        &mut self.buffers[self.read_index]
    }

    /// Current write buffer.
    #[inline]
    pub fn write_mut(&mut self) -> &mut [T] {
        &mut self.buffers[self.read_index ^ 1]
    }

    /// Read buffer and write buffer at once.
    #[inline]
    pub fn split_mut(&mut self) -> (&[T], &mut [T]) {
        let [first, second] = &mut self.buffers;
        if self.read_index == 0 {
            (first.as_slice(), second.as_mut_slice())
        } else {
            (second.as_slice(), first.as_mut_slice())
        }
    }

    /// Flips the roles: the buffer just written becomes the read buffer.
    ///
    /// # Panics
    ///
    /// Panics if a caller changed the length of one buffer through
    /// [`DoubleBuffer::read_vec_mut`].
    pub fn swap(&mut self) {
        assert_eq!(
            self.buffers[0].len(),
            self.buffers[1].len(),
            "double buffer halves diverged in length"
        );
        self.read_index ^= 1;
        self.frame_count += 1;
        tracing::trace!(frame = self.frame_count, read = self.read_index, "buffers swapped");
    }

    /// Index (0 or 1) of the current read buffer.
    #[inline]
    #[must_use]
    pub const fn read_index(&self) -> usize {
        self.read_index
    }

    /// Number of swaps so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Consumes the pair, returning `(read, write)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        let [first, second] = self.buffers;
        if self.read_index == 0 {
            (first, second)
        } else {
            (second, first)
        }
    }
}
