//! The static environment: cell classification and the grid shape it fixes for a run.

use ndarray::Array2;

use super::grid::{Cell, Shape, WALL_VALUE};

/// Classification of a single environment cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Wall,
    Exit,
}

/// The fixed `H×W` classification grid plus any cells the environment file marked as
/// pedestrian spawns.
#[derive(Debug, Clone)]
pub struct Environment {
    pub shape: Shape,
    cells: Array2<CellKind>,
    pub pedestrian_spawns: Vec<Cell>,
}

impl Environment {
    pub fn new(shape: Shape, cells: Array2<CellKind>, pedestrian_spawns: Vec<Cell>) -> Self {
        Environment {
            shape,
            cells,
            pedestrian_spawns,
        }
    }

    /// A bordered rectangle: walls on the outer ring, empty interior. Used for `input_method = 5`.
    pub fn bordered_rectangle(rows: usize, cols: usize) -> Self {
        let shape = Shape::new(rows, cols);
        let mut cells = Array2::from_elem((rows, cols), CellKind::Empty);

        for c in 0..cols {
            cells[(0, c)] = CellKind::Wall;
            cells[(rows - 1, c)] = CellKind::Wall;
        }
        for r in 0..rows {
            cells[(r, 0)] = CellKind::Wall;
            cells[(r, cols - 1)] = CellKind::Wall;
        }

        Environment::new(shape, cells, Vec::new())
    }

    pub fn kind(&self, cell: Cell) -> CellKind {
        self.cells[(cell.row, cell.col)]
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        matches!(self.kind(cell), CellKind::Wall)
    }

    pub fn is_exit(&self, cell: Cell) -> bool {
        matches!(self.kind(cell), CellKind::Exit)
    }

    pub fn set_kind(&mut self, cell: Cell, kind: CellKind) {
        self.cells[(cell.row, cell.col)] = kind;
    }

    /// A `H×W` matrix stamped with `WALL_VALUE` on walls and `0.0` elsewhere: the common base
    /// every per-exit floor field starts from.
    pub fn wall_skeleton(&self) -> Array2<f64> {
        self.cells.mapv(|k| {
            if matches!(k, CellKind::Wall) {
                WALL_VALUE
            } else {
                0.0
            }
        })
    }

    /// 4-neighbor flood fill of every `_`-marked cell into exit groups, used when the input
    /// method harvests exits directly from the environment file instead of the auxiliary file.
    pub fn flood_fill_exits(&self) -> Vec<Vec<Cell>> {
        let (rows, cols) = (self.shape.rows, self.shape.cols);
        let mut visited = Array2::from_elem((rows, cols), false);
        let mut groups = Vec::new();

        for r in 0..rows {
            for c in 0..cols {
                let start = Cell::new(r, c);
                if visited[(r, c)] || !self.is_exit(start) {
                    continue;
                }

                let mut group = Vec::new();
                let mut stack = vec![start];
                visited[(r, c)] = true;

                while let Some(cell) = stack.pop() {
                    group.push(cell);

                    for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                        let Some(next) = cell.checked_add(dr, dc) else {
                            continue;
                        };
                        if !self.shape.in_bounds(next) || visited[(next.row, next.col)] {
                            continue;
                        }
                        if self.is_exit(next) {
                            visited[(next.row, next.col)] = true;
                            stack.push(next);
                        }
                    }
                }

                groups.push(group);
            }
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_rectangle_has_wall_ring() {
        let env = Environment::bordered_rectangle(5, 5);
        assert!(env.is_wall(Cell::new(0usize, 0usize)));
        assert!(env.is_wall(Cell::new(0usize, 4usize)));
        assert!(env.is_wall(Cell::new(4usize, 2usize)));
        assert!(!env.is_wall(Cell::new(2usize, 2usize)));
    }

    #[test]
    fn flood_fill_groups_contiguous_exit_cells() {
        let shape = Shape::new(3, 4);
        let mut cells = Array2::from_elem((3, 4), CellKind::Empty);
        cells[(0, 1)] = CellKind::Exit;
        cells[(0, 2)] = CellKind::Exit;
        cells[(2, 3)] = CellKind::Exit;

        let env = Environment::new(shape, cells, Vec::new());
        let mut groups = env.flood_fill_exits();
        groups.sort_by_key(|g| g.len());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![Cell::new(2usize, 3usize)]);
        assert_eq!(groups[1].len(), 2);
    }
}
