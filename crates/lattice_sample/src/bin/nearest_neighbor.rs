//! # Nearest Neighbor Sample
//!
//! Headless frame loop over the grid-sorted particle system.
//!
//! ```bash
//! # Stock 8K scene
//! nearest_neighbor
//!
//! # Custom scene
//! nearest_neighbor crates/lattice_sample/config/nearest_neighbor.toml
//! ```

use std::process::ExitCode;
use std::time::{Duration, Instant};

use lattice_sample::{ParticleSystem, SampleConfig, SampleResult};

fn run() -> SampleResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SampleConfig::load(path)?,
        None => SampleConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                 LATTICE NEAREST NEIGHBOR v0.1.0");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("[CONFIG] particles: {}", config.particle_count());
    println!("[CONFIG] range:     {:?}", config.range);
    println!("[CONFIG] grid:      {:?}", config.grid_dim);
    println!("[CONFIG] backend:   {:?}", config.backend.kind);

    let mut system = ParticleSystem::start(&config)?;
    println!("[GRID] cell h: {:.3}", system.grid_h());

    let mut sort_total = Duration::ZERO;
    let mut kernel_total = Duration::ZERO;
    let mut worst_sort = Duration::ZERO;
    let mut highlighted = 0;
    let started = Instant::now();

    for _ in 0..config.frames {
        let stats = system.update()?;
        let sort = stats.sort.total_time();
        sort_total += sort;
        kernel_total += stats.kernel_time;
        worst_sort = worst_sort.max(sort);
        highlighted = stats.highlighted;
    }

    let elapsed = started.elapsed();
    let frames = config.frames.max(1);
    println!("───────────────────────────────────────────────────────────────────");
    println!("[RESULT] frames:          {}", config.frames);
    println!("[RESULT] wall time:       {elapsed:?}");
    println!("[RESULT] avg sort:        {:?}", sort_total / frames);
    println!("[RESULT] worst sort:      {worst_sort:?}");
    println!("[RESULT] avg kernel:      {:?}", kernel_total / frames);
    println!("[RESULT] neighbor block:  {highlighted} particles");

    system.destroy();
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}
