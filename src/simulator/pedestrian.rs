//! Pedestrian records and the population that owns them.

use ndarray::Array2;

use super::{exit::ExitSet, grid::Cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedestrianState {
    Moving,
    Stopped,
    Leaving,
    Left,
}

#[derive(Debug, Clone)]
pub struct Pedestrian {
    pub id: u32,
    pub origin: Cell,
    pub position: Cell,
    /// Only meaningful when `state == Moving`.
    pub intent: Option<Cell>,
    pub state: PedestrianState,
}

/// Owns every pedestrian record and the grid of their current positions.
#[derive(Debug, Clone)]
pub struct Population {
    pedestrians: Vec<Pedestrian>,
    pub grid: Array2<u32>,
}

impl Population {
    pub fn new(rows: usize, cols: usize) -> Self {
        Population {
            pedestrians: Vec::new(),
            grid: Array2::zeros((rows, cols)),
        }
    }

    pub fn len(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedestrians.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pedestrian> {
        self.pedestrians.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pedestrian> {
        self.pedestrians.iter_mut()
    }

    pub fn get(&self, id: u32) -> &Pedestrian {
        &self.pedestrians[id as usize - 1]
    }

    pub fn get_mut(&mut self, id: u32) -> &mut Pedestrian {
        &mut self.pedestrians[id as usize - 1]
    }

    /// Places a new pedestrian at `cell`, returning its fresh id. Marks the pedestrian grid and
    /// increments `heat_map` at `cell`.
    pub fn place(&mut self, cell: Cell, heat_map: &mut Array2<u64>) -> u32 {
        let id = self.pedestrians.len() as u32 + 1;
        self.pedestrians.push(Pedestrian {
            id,
            origin: cell,
            position: cell,
            intent: None,
            state: PedestrianState::Moving,
        });
        self.grid[(cell.row, cell.col)] = id;
        heat_map[(cell.row, cell.col)] += 1;
        id
    }

    /// Randomly places `n` pedestrians on admissible interior cells (not occupied, not wall,
    /// not exit). Zeroes the pedestrian grid first. Assumes the caller has verified there is
    /// enough room; this never gives up.
    pub fn random_place(
        &mut self,
        n: u32,
        exits: &ExitSet,
        heat_map: &mut Array2<u64>,
        rng: &mut fastrand::Rng,
    ) {
        self.grid.fill(0);
        self.pedestrians.clear();

        let (rows, cols) = self.grid.dim();
        let mut placed = 0;
        while placed < n {
            let row = rng.usize(1..rows - 1);
            let col = rng.usize(1..cols - 1);
            let cell = Cell::new(row, col);

            if self.grid[(row, col)] != 0 || exits.is_exit_cell(cell) || exits.is_wall_cell(cell) {
                continue;
            }

            self.place(cell, heat_map);
            placed += 1;
        }
    }

    /// Resets every pedestrian back to its origin, all `Moving`, and rebuilds the pedestrian
    /// grid accordingly. Used between simulations when placement was explicit (not random).
    pub fn reset_to_origin(&mut self) {
        self.grid.fill(0);
        for pedestrian in &mut self.pedestrians {
            pedestrian.position = pedestrian.origin;
            pedestrian.state = PedestrianState::Moving;
            pedestrian.intent = None;
            self.grid[(pedestrian.position.row, pedestrian.position.col)] = pedestrian.id;
        }
    }

    /// Drops every pedestrian record, freeing the population for the next simulation's random
    /// placement.
    pub fn clear(&mut self) {
        self.grid.fill(0);
        self.pedestrians.clear();
    }

    pub fn all_left(&self) -> bool {
        self.pedestrians
            .iter()
            .all(|p| p.state == PedestrianState::Left)
    }
}
