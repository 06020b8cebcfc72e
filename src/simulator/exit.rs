//! Exits and the floor field they induce: the static potential pedestrians descend on.

use ndarray::Array2;

use crate::error::InaccessibleExit;

use super::{
    environment::Environment,
    grid::{diag_valid, Cell, Shape, EXIT_VALUE, KERNEL, MOORE_OFFSETS, WALL_VALUE},
};

/// A single exit: a width-`≥1` contiguous group of cells plus its own floor field.
#[derive(Debug, Clone)]
pub struct Exit {
    pub cells: Vec<Cell>,
    pub field: Array2<f64>,
}

impl Exit {
    /// Width-1 exit at `cell`, field not yet built.
    pub fn new(shape: Shape, cell: Cell) -> Self {
        Exit {
            cells: vec![cell],
            field: shape.zeros_f64(),
        }
    }

    pub fn expand(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Builds this exit's floor field in place via iterative relaxation.
    ///
    /// Returns `Err(InaccessibleExit::Unreachable)` if no exit cell has a free orthogonal
    /// neighbor.
    pub fn build_field(&mut self, environment: &Environment) -> Result<(), InaccessibleExit> {
        let shape = environment.shape;
        self.field = environment.wall_skeleton();

        for &cell in &self.cells {
            self.field[(cell.row, cell.col)] = EXIT_VALUE;
        }

        if !self.is_accessible(shape) {
            return Err(InaccessibleExit::Unreachable);
        }

        let mut aux = self.field.clone();
        loop {
            let mut changed = false;

            for r in 0..shape.rows {
                for c in 0..shape.cols {
                    let value = self.field[(r, c)];
                    if value == WALL_VALUE || value == 0.0 {
                        continue;
                    }

                    let cell = Cell::new(r, c);
                    for &(dr, dc) in &MOORE_OFFSETS {
                        let Some(neighbor) = cell.checked_add(dr, dc) else {
                            continue;
                        };
                        if !shape.in_bounds(neighbor) {
                            continue;
                        }

                        let neighbor_value = self.field[(neighbor.row, neighbor.col)];
                        if neighbor_value == WALL_VALUE || neighbor_value == EXIT_VALUE {
                            continue;
                        }

                        if dr != 0 && dc != 0 && !diag_valid(cell, dr, dc, &self.field) {
                            continue;
                        }

                        let proposed = value + KERNEL[(dr + 1) as usize][(dc + 1) as usize];
                        let current_aux = aux[(neighbor.row, neighbor.col)];
                        if current_aux == 0.0 || proposed < current_aux {
                            aux[(neighbor.row, neighbor.col)] = proposed;
                            changed = true;
                        }
                    }
                }
            }

            self.field.assign(&aux);
            if !changed {
                break;
            }
        }

        Ok(())
    }

    fn is_accessible(&self, shape: Shape) -> bool {
        self.cells.iter().any(|&cell| {
            [(-1, 0), (1, 0), (0, -1), (0, 1)].iter().any(|&(dr, dc)| {
                let Some(neighbor) = cell.checked_add(dr, dc) else {
                    return false;
                };
                if !shape.in_bounds(neighbor) {
                    return false;
                }
                let value = self.field[(neighbor.row, neighbor.col)];
                value != WALL_VALUE && value != EXIT_VALUE
            })
        })
    }
}

/// An ordered collection of exits plus the pointwise-minimum combined field pedestrians
/// actually navigate on.
#[derive(Debug, Clone)]
pub struct ExitSet {
    pub exits: Vec<Exit>,
    pub combined: Array2<f64>,
}

impl ExitSet {
    pub fn new(shape: Shape) -> Self {
        ExitSet {
            exits: Vec::new(),
            combined: shape.zeros_f64(),
        }
    }

    pub fn add_exit(&mut self, shape: Shape, cell: Cell) {
        self.exits.push(Exit::new(shape, cell));
    }

    pub fn expand_last(&mut self, cell: Cell) {
        if let Some(exit) = self.exits.last_mut() {
            exit.expand(cell);
        }
    }

    /// Builds every exit's floor field, then combines them by pointwise minimum.
    ///
    /// Returns `Err(InaccessibleExit::Empty)` if this set has no exits at all — reachable on
    /// valid input when a batch entry (an auxiliary-file line, or an environment file harvested
    /// for `_` cells) legitimately names none.
    pub fn build(&mut self, environment: &Environment) -> Result<(), InaccessibleExit> {
        if self.exits.is_empty() {
            return Err(InaccessibleExit::Empty);
        }

        for exit in &mut self.exits {
            exit.build_field(environment)?;
        }

        let mut combined = self.exits[0].field.clone();
        for exit in &self.exits[1..] {
            combined.zip_mut_with(&exit.field, |a, b| {
                if *b < *a {
                    *a = *b;
                }
            });
        }
        self.combined = combined;

        Ok(())
    }

    pub fn is_exit_cell(&self, cell: Cell) -> bool {
        self.combined[(cell.row, cell.col)] == EXIT_VALUE
    }

    pub fn is_wall_cell(&self, cell: Cell) -> bool {
        self.combined[(cell.row, cell.col)] == WALL_VALUE
    }
}
