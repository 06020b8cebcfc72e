//! The three result renderers (visual grid, step counts, averaged heat map) and the
//! auto-naming convention for `-o`/`--output-file` when no explicit name is given.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::simulator::{
    exit::ExitSet,
    grid::{EXIT_VALUE, WALL_VALUE},
    pedestrian::Population,
};

/// Derives an output file name from the current local timestamp and the input file's stem,
/// matching the donor crate's own log-file naming convention. Creates the parent directory if
/// it is missing.
pub fn auto_named_path(input_file: &Path) -> std::io::Result<PathBuf> {
    let now = chrono::Local::now();
    let stem = input_file.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let dir = PathBuf::from("output");
    fs::create_dir_all(&dir)?;

    let name = format!("{stem}_{}.txt", now.format("%Y-%m-%d_%H%M%S"));
    Ok(dir.join(name))
}

/// Prints the exit cells of the current batch entry, honoring `--details`.
pub fn render_header(out: &mut impl Write, exits: &ExitSet) -> std::io::Result<()> {
    write!(out, "Conjunto de saídas:")?;
    let num_exits = exits.exits.len();
    for (s, exit) in exits.exits.iter().enumerate() {
        let separator = if s == num_exits - 1 { '.' } else { ',' };
        let width = exit.cells.len();
        for (c, cell) in exit.cells.iter().enumerate() {
            let within = if c == width - 1 { separator } else { '+' };
            write!(out, " {} {}{}", cell.row, cell.col, within)?;
        }
    }
    writeln!(out)
}

pub fn render_inaccessible_notice(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Pelo menos uma das saídas do conjunto não é acessível.")
}

/// `output_type = 1`. One frame per tick; overlays pedestrians on the classification field.
pub fn render_tick(out: &mut impl Write, population: &Population, exits: &ExitSet) -> std::io::Result<()> {
    let (rows, cols) = exits.combined.dim();
    for r in 0..rows {
        for c in 0..cols {
            let symbol = if population.grid[(r, c)] != 0 {
                '@'
            } else if exits.combined[(r, c)] == EXIT_VALUE {
                'S'
            } else if exits.combined[(r, c)] == WALL_VALUE {
                '#'
            } else {
                '.'
            };
            write!(out, "{symbol}")?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// `output_type = 2`. `-1` is the placeholder this function does *not* produce; the caller
/// writes `num_simulations` copies of it directly when a batch entry's exit set is inaccessible.
pub fn render_step_counts(out: &mut impl Write, step_counts: &[u32]) -> std::io::Result<()> {
    for steps in step_counts {
        write!(out, "{steps} ")?;
    }
    writeln!(out)
}

pub fn render_inaccessible_step_counts(out: &mut impl Write, num_simulations: u32) -> std::io::Result<()> {
    for _ in 0..num_simulations {
        write!(out, "-1 ")?;
    }
    writeln!(out)
}

/// `output_type = 3`. Each cell is the occupancy count divided by the number of simulations.
pub fn render_heat_map(out: &mut impl Write, heat_map: &Array2<u64>, num_simulations: u32) -> std::io::Result<()> {
    let (rows, cols) = heat_map.dim();
    let divisor = num_simulations.max(1) as f64;
    for r in 0..rows {
        for c in 0..cols {
            write!(out, "{:7.2} ", heat_map[(r, c)] as f64 / divisor)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// Clears the terminal, matching the donor's ANSI-escape screen clear between visual frames.
/// Only meaningful when writing directly to an interactive terminal, not a redirected file.
pub fn clear_screen(out: &mut impl Write) -> std::io::Result<()> {
    write!(out, "\u{1b}[1;1H\u{1b}[2J")
}
