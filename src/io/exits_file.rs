//! Parses the auxiliary file: one batch entry per line, each a whitespace-separated sequence of
//! `R C S` triples describing exit cells, where `S` says whether the next triple extends the
//! current exit (`+`), starts a new one (`,`), or ends the line (`.`).

use std::fs;
use std::path::Path;

use crate::error::EnvironmentError;
use crate::simulator::grid::Cell;

/// One line's worth of exits, in the order they were declared.
pub type ExitGroups = Vec<Vec<Cell>>;

pub fn load(path: &Path) -> Result<Vec<ExitGroups>, EnvironmentError> {
    let text = fs::read_to_string(path).map_err(|source| EnvironmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_line(line, path))
        .collect()
}

fn parse_line(line: &str, path: &Path) -> Result<ExitGroups, EnvironmentError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut groups: ExitGroups = Vec::new();
    let mut starts_new = true;
    let mut i = 0;

    while i < tokens.len() {
        let row: usize = tokens[i].parse().map_err(|_| malformed(path))?;
        let col: usize = tokens.get(i + 1).ok_or_else(|| malformed(path))?.parse().map_err(|_| malformed(path))?;
        let separator = tokens.get(i + 2).ok_or_else(|| malformed(path))?;
        i += 3;

        let cell = Cell::new(row, col);
        if starts_new {
            groups.push(vec![cell]);
        } else {
            groups.last_mut().ok_or_else(|| malformed(path))?.push(cell);
        }

        match *separator {
            "+" => starts_new = false,
            "," => starts_new = true,
            "." => break,
            _ => return Err(malformed(path)),
        }
    }

    Ok(groups)
}

fn malformed(path: &Path) -> EnvironmentError {
    EnvironmentError::MalformedAuxiliaryFile { path: path.to_path_buf() }
}
