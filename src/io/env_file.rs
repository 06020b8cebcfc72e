//! Parses the environment text format: an `H W` header followed by `H` lines of exactly `W`
//! characters drawn from `{'#', '_', '.', 'p', 'P'}`.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::EnvironmentError;
use crate::simulator::environment::{CellKind, Environment};
use crate::simulator::grid::{Cell, Shape};

/// Whether `_` cells in the file should be loaded as exits or masked to walls, depending on the
/// current input method (methods that source exits from the auxiliary file instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitHandling {
    LoadFromFile,
    TreatAsWall,
}

pub fn load(path: &Path, exit_handling: ExitHandling) -> Result<Environment, EnvironmentError> {
    let text = fs::read_to_string(path).map_err(|source| EnvironmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&text, path, exit_handling)
}

fn parse(text: &str, path: &Path, exit_handling: ExitHandling) -> Result<Environment, EnvironmentError> {
    let mut lines = text.lines();

    let header = lines.next().ok_or_else(|| EnvironmentError::MissingHeader { path: owned(path) })?;
    let mut header_fields = header.split_whitespace();
    let (rows, cols) = match (header_fields.next().and_then(|s| s.parse::<usize>().ok()), header_fields.next().and_then(|s| s.parse::<usize>().ok())) {
        (Some(rows), Some(cols)) => (rows, cols),
        _ => return Err(EnvironmentError::MissingHeader { path: owned(path) }),
    };

    let mut cells = Array2::from_elem((rows, cols), CellKind::Empty);
    let mut spawns = Vec::new();

    let mut line_count = 0;
    for (i, line) in lines.enumerate() {
        if i >= rows {
            break;
        }
        line_count += 1;

        let chars: Vec<char> = line.chars().collect();
        if chars.len() != cols {
            return Err(EnvironmentError::WrongLineLength {
                path: owned(path),
                line: i,
                expected: cols,
                actual: chars.len(),
            });
        }

        for (h, &ch) in chars.iter().enumerate() {
            let kind = match ch {
                '#' => CellKind::Wall,
                '_' => match exit_handling {
                    ExitHandling::LoadFromFile => CellKind::Exit,
                    ExitHandling::TreatAsWall => CellKind::Wall,
                },
                '.' => CellKind::Empty,
                'p' | 'P' => {
                    spawns.push(Cell::new(i, h));
                    CellKind::Empty
                }
                other => {
                    return Err(EnvironmentError::UnknownCharacter {
                        path: owned(path),
                        line: i,
                        col: h,
                        ch: other,
                    })
                }
            };
            cells[(i, h)] = kind;
        }
    }

    if line_count != rows {
        return Err(EnvironmentError::WrongLineCount {
            path: owned(path),
            expected: rows,
            actual: line_count,
        });
    }

    Ok(Environment::new(Shape::new(rows, cols), cells, spawns))
}

fn owned(path: &Path) -> PathBuf {
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_body() {
        let text = "3 3\n#_#\n#P#\n###\n";
        let env = parse(text, Path::new("test.txt"), ExitHandling::LoadFromFile).unwrap();

        assert!(env.is_wall(Cell::new(0usize, 0usize)));
        assert!(env.is_exit(Cell::new(0usize, 1usize)));
        assert_eq!(env.pedestrian_spawns, vec![Cell::new(1usize, 1usize)]);
    }

    #[test]
    fn exit_as_wall_masks_underscore() {
        let text = "3 3\n#_#\n#.#\n###\n";
        let env = parse(text, Path::new("test.txt"), ExitHandling::TreatAsWall).unwrap();
        assert!(env.is_wall(Cell::new(0usize, 1usize)));
        assert!(!env.is_exit(Cell::new(0usize, 1usize)));
    }

    #[test]
    fn wrong_line_length_is_reported() {
        let text = "2 3\n##\n###\n";
        let result = parse(text, Path::new("test.txt"), ExitHandling::LoadFromFile);
        assert!(matches!(result, Err(EnvironmentError::WrongLineLength { .. })));
    }

    #[test]
    fn unknown_character_is_reported() {
        let text = "1 3\n#X#\n";
        let result = parse(text, Path::new("test.txt"), ExitHandling::LoadFromFile);
        assert!(matches!(result, Err(EnvironmentError::UnknownCharacter { .. })));
    }
}
