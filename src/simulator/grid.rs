//! Grid primitives shared by the floor field and the movement pipeline.

use ndarray::Array2;
use num_traits::PrimInt;

/// Value stamped on wall cells in every floor-field grid.
pub const WALL_VALUE: f64 = 1000.0;
/// Value stamped on exit cells in every floor-field grid.
pub const EXIT_VALUE: f64 = 1.0;

/// Relaxation kernel: cost of moving into a neighbor, indexed by `[dr + 1][dc + 1]`.
pub const KERNEL: [[f64; 3]; 3] = [
    [1.5, 1.0, 1.5],
    [1.0, 0.0, 1.0],
    [1.5, 1.0, 1.5],
];

/// A cell coordinate, row-major, zero-based.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new<T: PrimInt>(row: T, col: T) -> Self {
        Cell {
            row: row.to_usize().unwrap(),
            col: col.to_usize().unwrap(),
        }
    }

    /// Offsets this cell by a signed delta, returning `None` if either axis would go negative.
    pub fn checked_add(self, dr: i32, dc: i32) -> Option<Cell> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if row < 0 || col < 0 {
            None
        } else {
            Some(Cell {
                row: row as usize,
                col: col as usize,
            })
        }
    }
}

unsafe impl ndarray::NdIndex<ndarray::Ix2> for Cell {
    fn index_checked(&self, dim: &ndarray::Ix2, strides: &ndarray::Ix2) -> Option<isize> {
        (self.row, self.col).index_checked(dim, strides)
    }

    fn index_unchecked(&self, strides: &ndarray::Ix2) -> isize {
        (self.row, self.col).index_unchecked(strides)
    }
}

/// The eight Moore-neighborhood offsets, orthogonal ones first.
pub const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Shape shared by every grid in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn zeros_f64(&self) -> Array2<f64> {
        Array2::zeros((self.rows, self.cols))
    }

    pub fn zeros_i32(&self) -> Array2<i32> {
        Array2::zeros((self.rows, self.cols))
    }

    pub fn zeros_u64(&self) -> Array2<u64> {
        Array2::zeros((self.rows, self.cols))
    }
}

/// Returns false iff both orthogonal neighbors that share an edge with the diagonal corner
/// `(dr, dc)` are walls, per the corner rule in the simulation spec.
pub fn diag_valid(cell: Cell, dr: i32, dc: i32, field: &Array2<f64>) -> bool {
    debug_assert!(dr != 0 && dc != 0, "diag_valid is only meaningful for diagonal offsets");

    let along_row = Cell::new(cell.row, (cell.col as i32 + dc) as usize);
    let along_col = Cell::new((cell.row as i32 + dr) as usize, cell.col);

    let blocked_row = field.get((along_row.row, along_row.col)) == Some(&WALL_VALUE);
    let blocked_col = field.get((along_col.row, along_col.col)) == Some(&WALL_VALUE);

    !(blocked_row && blocked_col)
}
