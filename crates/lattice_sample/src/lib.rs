//! # LATTICE Sample - 2D Nearest Neighbor
//!
//! A particle system that grid-sorts its particles every frame and colors the
//! neighbors of one displayed particle.
//!
//! ## Example
//!
//! ```rust
//! use lattice_sample::{ParticleSystem, SampleConfig};
//!
//! let config = SampleConfig::from_toml_str("particle_count = \"num_1k\"").unwrap();
//! let mut system = ParticleSystem::start(&config).unwrap();
//!
//! let stats = system.update().unwrap();
//! assert_eq!(stats.frame, 1);
//! assert!(stats.highlighted >= 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod kernel;
pub mod particle;
pub mod system;

pub use config::{BackendConfig, ConfigError, ParticleCount, SampleConfig};
pub use error::{SampleError, SampleResult};
pub use kernel::highlight_neighbors;
pub use particle::Particle;
pub use system::{FrameStats, ParticleSystem};
