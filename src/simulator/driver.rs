//! Batch orchestration: run every simulation against one exit set, seeding each simulation's RNG
//! deterministically and optionally dispatching simulations in parallel.

use ndarray::Array2;
use rayon::prelude::*;

use crate::error::InaccessibleExit;

use super::{
    environment::Environment,
    exit::ExitSet,
    grid::Shape,
    movement::{self, MovementConfig},
    pedestrian::Population,
};

/// Toggles and counts that hold for an entire batch entry (one exit set).
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    pub num_simulations: u32,
    pub num_pedestrians: u32,
    pub movement: MovementConfig,
    /// Dispatch the simulations of a batch entry across a rayon thread pool. Never splits a
    /// single tick across threads; each simulation still runs its pipeline serially.
    pub parallel: bool,
    /// `true` for input methods that load fixed pedestrian positions from the environment file
    /// (methods 3 and 4): pedestrians are reset to origin between simulations rather than
    /// re-placed at random.
    pub explicit_placement: bool,
}

/// The outcome of running every simulation in one batch entry.
pub struct BatchResult {
    /// Time-step count at which each simulation emptied, in simulation order.
    pub step_counts: Vec<u32>,
    /// Per-cell occupancy counts, summed over every simulation in the batch entry.
    pub heat_map: Array2<u64>,
}

/// Builds `exits`' combined field, then runs `config.num_simulations` independent simulations,
/// seeding simulation `i`'s RNG stream with `seed_base + i`. Returns `Err` unchanged if the
/// exit set is inaccessible; the caller emits a placeholder and moves on to the next batch
/// entry, mirroring the original driver's loop.
pub fn run_batch(
    environment: &Environment,
    exits: &mut ExitSet,
    population_template: &Population,
    seed_base: u64,
    config: &DriverConfig,
) -> Result<BatchResult, InaccessibleExit> {
    exits.build(environment)?;

    let shape = environment.shape;
    let indices: Vec<u32> = (0..config.num_simulations).collect();

    let run_one = |sim_index: &u32| -> (u32, Array2<u64>) {
        let sim_index = *sim_index;
        let mut rng = fastrand::Rng::with_seed(seed_base + sim_index as u64);
        let mut population = population_template.clone();
        let mut heat_map = shape.zeros_u64();

        if config.explicit_placement {
            population.reset_to_origin();
            for pedestrian in population.iter() {
                heat_map[(pedestrian.position.row, pedestrian.position.col)] += 1;
            }
        } else {
            population.random_place(config.num_pedestrians, exits, &mut heat_map, &mut rng);
        }

        let mut steps = 0u32;
        while !population.is_empty() && !population.all_left() {
            movement::tick(&mut population, exits, &mut heat_map, &config.movement, &mut rng);
            steps += 1;
        }

        (steps, heat_map)
    };

    let results: Vec<(u32, Array2<u64>)> = if config.parallel {
        indices.par_iter().map(run_one).collect()
    } else {
        indices.iter().map(run_one).collect()
    };

    let mut step_counts = Vec::with_capacity(results.len());
    let mut heat_map = shape.zeros_u64();
    for (steps, sim_heat) in results {
        step_counts.push(steps);
        heat_map += &sim_heat;
    }

    Ok(BatchResult { step_counts, heat_map })
}

/// Carries the running seed counter across successive batch entries, matching the original
/// driver's single global `seed` variable that increments once per simulation regardless of
/// which exit set is current.
#[derive(Debug, Clone, Copy)]
pub struct SeedCursor {
    next: u64,
}

impl SeedCursor {
    pub fn new(original_seed: u64) -> Self {
        SeedCursor { next: original_seed }
    }

    /// Returns the seed base for the next batch entry's simulations and advances the cursor
    /// past them.
    pub fn take(&mut self, num_simulations: u32) -> u64 {
        let base = self.next;
        self.next += num_simulations as u64;
        base
    }
}
