//! # Frame Buffers
//!
//! ## The Problem
//!
//! ```text
//! A kernel that reads every particle's neighbors and writes every
//! particle's new state cannot do both in one buffer:
//!
//!   work item i writes particle j while work item k still reads j
//!   → result depends on scheduling
//! ```
//!
//! ## The Solution: Double Buffering
//!
//! ```text
//! Frame N:
//!   grid sort on Buffer A
//!   kernel reads A, writes B
//!
//! Frame N+1:
//!   SWAP (index flip, no copy)
//!   grid sort on Buffer B
//!   kernel reads B, writes A
//! ```

mod double_buffer;

pub use double_buffer::DoubleBuffer;
