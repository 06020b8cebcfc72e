//! The per-tick movement pipeline: panic, intent selection, X-swap resolution, target-conflict
//! resolution, commit, grid refresh, state reset. Every stochastic tie-break in the simulation
//! happens here, in the order the functions are declared.

use ordered_float::NotNan;

use super::{
    exit::ExitSet,
    grid::{diag_valid, Cell, MOORE_OFFSETS, WALL_VALUE},
    pedestrian::{PedestrianState, Population},
};

/// Toggles that change pipeline behavior without changing its stage order.
#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    /// Stay on an exit cell for one extra tick (`Leaving`) before `Left`, instead of leaving
    /// immediately on arrival.
    pub linger_at_exit: bool,
    /// Use the "always-smallest-or-wait" policy instead of "smallest-unoccupied".
    pub always_smallest: bool,
    /// Exclude diagonal candidates from intent selection entirely.
    pub avoid_corner_moves: bool,
    /// Skip X-swap resolution, permitting pedestrians to cross.
    pub allow_x_moves: bool,
}

const PANIC_PROBABILITY: f64 = 0.05;

/// Stage (a). Draws one RNG value per `Moving` pedestrian; `value/100 <= 0.05` stops them.
pub fn panic(population: &mut Population, rng: &mut fastrand::Rng) {
    for pedestrian in population.iter_mut() {
        if pedestrian.state != PedestrianState::Moving {
            continue;
        }

        let draw = rng.u32(1..=100);
        if draw as f64 / 100.0 <= PANIC_PROBABILITY {
            pedestrian.state = PedestrianState::Stopped;
        }
    }
}

struct Candidate {
    cell: Cell,
    value: f64,
}

fn gather_candidates(
    position: Cell,
    exits: &ExitSet,
    positions: &ndarray::Array2<u32>,
    config: &MovementConfig,
    exclude_occupied: bool,
) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(8);

    for &(dr, dc) in &MOORE_OFFSETS {
        let Some(neighbor) = position.checked_add(dr, dc) else {
            continue;
        };
        let Some(&value) = exits.combined.get((neighbor.row, neighbor.col)) else {
            continue;
        };
        if value == WALL_VALUE {
            continue;
        }

        let is_diagonal = dr != 0 && dc != 0;
        if is_diagonal {
            if config.avoid_corner_moves {
                continue;
            }
            if !diag_valid(position, dr, dc, &exits.combined) {
                continue;
            }
        }

        if exclude_occupied && positions[(neighbor.row, neighbor.col)] != 0 {
            continue;
        }

        candidates.push(Candidate { cell: neighbor, value });
    }

    candidates
}

/// Stage (b). For each `Moving` pedestrian, picks an intent cell from its Moore neighborhood
/// under the configured policy, reading only from the pedestrian grid as it stood at tick
/// start — never from intents written earlier in this same pass.
pub fn determine_move(
    population: &mut Population,
    exits: &ExitSet,
    config: &MovementConfig,
    rng: &mut fastrand::Rng,
) {
    let positions = population.grid.clone();

    for pedestrian in population.iter_mut() {
        if pedestrian.state != PedestrianState::Moving {
            continue;
        }

        let candidates = gather_candidates(
            pedestrian.position,
            exits,
            &positions,
            config,
            !config.always_smallest,
        );

        if candidates.is_empty() {
            pedestrian.state = PedestrianState::Stopped;
            pedestrian.intent = None;
            continue;
        }

        let min_value = candidates
            .iter()
            .map(|c| NotNan::new(c.value).unwrap())
            .min()
            .unwrap();
        let tied: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| NotNan::new(c.value).unwrap() == min_value)
            .collect();

        let chosen = tied[rng.usize(0..tied.len())];

        if config.always_smallest && positions[(chosen.cell.row, chosen.cell.col)] != 0 {
            pedestrian.state = PedestrianState::Stopped;
            pedestrian.intent = None;
        } else {
            pedestrian.intent = Some(chosen.cell);
        }
    }
}

/// Stage (c). Scans the interior of the pedestrian grid in row-major order, testing each
/// occupied cell against its east neighbor and the three cells in the row below, which is
/// sufficient to visit every adjacent pair exactly once (north/west neighbors were already the
/// pivot when they were visited).
pub fn resolve_x_moves(population: &mut Population, config: &MovementConfig, rng: &mut fastrand::Rng) {
    if config.allow_x_moves {
        return;
    }

    let grid = population.grid.clone();
    let (rows, cols) = grid.dim();
    if rows < 3 || cols < 3 {
        return;
    }

    for i in 1..rows - 1 {
        for h in 1..cols - 1 {
            let current_id = grid[(i, h)];
            if current_id == 0 {
                continue;
            }
            if population.get(current_id).state != PedestrianState::Moving {
                continue;
            }

            let east = grid[(i, h + 1)];
            if east != 0 {
                test_x_pair(population, current_id, east, rng);
            }

            for k in [-1i32, 0, 1] {
                let col = (h as i32 + k) as usize;
                let south = grid[(i + 1, col)];
                if south != 0 {
                    test_x_pair(population, current_id, south, rng);
                }
            }
        }
    }
}

fn test_x_pair(population: &mut Population, a_id: u32, b_id: u32, rng: &mut fastrand::Rng) {
    let (a_pos, a_intent, a_state) = {
        let a = population.get(a_id);
        (a.position, a.intent, a.state)
    };
    let (b_pos, b_intent, b_state) = {
        let b = population.get(b_id);
        (b.position, b.intent, b.state)
    };

    if a_state != PedestrianState::Moving || b_state != PedestrianState::Moving {
        return;
    }
    let (Some(a_intent), Some(b_intent)) = (a_intent, b_intent) else {
        return;
    };

    // Vertical or horizontal segments have no finite/defined slope; no X-swap possible.
    if a_intent.col == a_pos.col || b_intent.col == b_pos.col {
        return;
    }
    if a_intent.row == a_pos.row || b_intent.row == b_pos.row {
        return;
    }

    let m_a = (a_intent.row as f64 - a_pos.row as f64) / (a_intent.col as f64 - a_pos.col as f64);
    let n_a = a_pos.row as f64 - m_a * a_pos.col as f64;
    let m_b = (b_intent.row as f64 - b_pos.row as f64) / (b_intent.col as f64 - b_pos.col as f64);
    let n_b = b_pos.row as f64 - m_b * b_pos.col as f64;

    if m_a == m_b {
        return;
    }

    let x = (n_b - n_a) / (m_a - m_b);
    let y = m_a * x + n_a;

    // Same target: a target-conflict, not an X-swap; stage (d) will resolve it.
    if x == a_intent.col as f64 && y == a_intent.row as f64 {
        return;
    }

    let a_col_range = (a_pos.col.min(a_intent.col) as f64, a_pos.col.max(a_intent.col) as f64);
    let a_row_range = (a_pos.row.min(a_intent.row) as f64, a_pos.row.max(a_intent.row) as f64);

    if x > a_col_range.0 && x < a_col_range.1 && y > a_row_range.0 && y < a_row_range.1 {
        let loser = if rng.bool() { a_id } else { b_id };
        population.get_mut(loser).state = PedestrianState::Stopped;
    }
}

/// Stage (d). Resolves pedestrians that intend to move into the same cell. Conflict groups are
/// tracked in a working matrix: `0` means no claimant yet, a positive value is a unique
/// claimant id, a negative value `-k` indexes a conflict group of 1-based index `k`.
pub fn resolve_target_conflicts(population: &mut Population, rng: &mut fastrand::Rng) {
    let (rows, cols) = population.grid.dim();
    let mut claims = ndarray::Array2::<i64>::zeros((rows, cols));
    let mut groups: Vec<Vec<u32>> = Vec::new();

    let moving_ids: Vec<u32> = population
        .iter()
        .filter(|p| p.state == PedestrianState::Moving)
        .map(|p| p.id)
        .collect();

    for id in moving_ids {
        let intent = population.get(id).intent.expect("moving pedestrian must have an intent");
        let cell = (intent.row, intent.col);
        let value = claims[cell];

        if value == 0 {
            claims[cell] = id as i64;
        } else if value > 0 {
            groups.push(vec![value as u32, id]);
            claims[cell] = -(groups.len() as i64);
        } else {
            let index = (-value - 1) as usize;
            groups[index].push(id);
        }
    }

    for group in groups {
        let winner_index = rng.usize(0..group.len());
        for (i, &id) in group.iter().enumerate() {
            if i != winner_index {
                population.get_mut(id).state = PedestrianState::Stopped;
            }
        }
    }
}

/// Stage (e). Moves every `Moving` pedestrian to its intent, transitioning to `Leaving`/`Left`
/// on an exit cell; advances `Leaving` to `Left`.
pub fn commit(population: &mut Population, exits: &ExitSet, heat_map: &mut ndarray::Array2<u64>, config: &MovementConfig) {
    for pedestrian in population.iter_mut() {
        match pedestrian.state {
            PedestrianState::Moving => {
                let intent = pedestrian.intent.expect("moving pedestrian must have an intent");
                pedestrian.position = intent;

                if exits.is_exit_cell(pedestrian.position) {
                    if config.linger_at_exit {
                        // Still occupies its cell this tick; refresh_grid below counts it.
                        pedestrian.state = PedestrianState::Leaving;
                    } else {
                        // Leaves on arrival: refresh_grid excludes LEFT, so this is the only
                        // place the exit step itself gets counted.
                        pedestrian.state = PedestrianState::Left;
                        heat_map[(pedestrian.position.row, pedestrian.position.col)] += 1;
                    }
                }
            }
            PedestrianState::Leaving => {
                pedestrian.state = PedestrianState::Left;
            }
            PedestrianState::Stopped | PedestrianState::Left => {}
        }
    }
}

/// Stage (f). Rebuilds the pedestrian grid from scratch from current positions, and increments
/// the heat map once per occupied cell for this tick (the canonical per-tick increment point;
/// the other is [`Population::place`]). `LEFT` pedestrians no longer occupy a cell.
pub fn refresh_grid(population: &mut Population, heat_map: &mut ndarray::Array2<u64>) {
    population.grid.fill(0);

    let updates: Vec<(Cell, u32)> = population
        .iter()
        .filter(|p| p.state != PedestrianState::Left)
        .map(|p| (p.position, p.id))
        .collect();

    for (cell, id) in updates {
        population.grid[(cell.row, cell.col)] = id;
        heat_map[(cell.row, cell.col)] += 1;
    }
}

/// Stage (g). Every pedestrian not `Left` or `Leaving` becomes `Moving` for the next tick.
pub fn reset_states(population: &mut Population) {
    for pedestrian in population.iter_mut() {
        if pedestrian.state != PedestrianState::Left && pedestrian.state != PedestrianState::Leaving {
            pedestrian.state = PedestrianState::Moving;
        }
        pedestrian.intent = None;
    }
}

/// Runs one full tick: stages (a) through (g) in order. Returns nothing; callers inspect
/// `population.all_left()` for termination.
pub fn tick(
    population: &mut Population,
    exits: &ExitSet,
    heat_map: &mut ndarray::Array2<u64>,
    config: &MovementConfig,
    rng: &mut fastrand::Rng,
) {
    panic(population, rng);
    determine_move(population, exits, config, rng);
    resolve_x_moves(population, config, rng);
    resolve_target_conflicts(population, rng);
    commit(population, exits, heat_map, config);
    refresh_grid(population, heat_map);
    reset_states(population);
}
