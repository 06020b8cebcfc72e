//! The four error kinds the core distinguishes, and nothing else — simulation-internal events
//! (panic, conflict loss, no admissible move) are pedestrian state transitions, never errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("allocation error: failed to allocate a {rows}x{cols} grid")]
    Allocation { rows: usize, cols: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input method {method} requires an auxiliary file (--auxiliary-file)")]
    MissingAuxiliaryFile { method: u8 },

    #[error("input method 5 requires both --lin and --col")]
    MissingGridDimensions,

    #[error("num_simulations must be at least 1, got {0}")]
    InvalidSimulationCount(u32),

    #[error("num_pedestrians must be at least 1, got {0}")]
    InvalidPedestrianCount(u32),

    #[error("grid dimensions must be at least 3x3 to leave room for random placement, got {rows}x{cols}")]
    GridTooSmall { rows: usize, cols: usize },
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("could not read environment file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing or malformed dimensions header in {path}")]
    MissingHeader { path: PathBuf },

    #[error("line {line} in {path} has {actual} columns, expected {expected}")]
    WrongLineLength {
        path: PathBuf,
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unknown character {ch:?} at line {line}, column {col} in {path}")]
    UnknownCharacter {
        path: PathBuf,
        line: usize,
        col: usize,
        ch: char,
    },

    #[error("expected {expected} lines in {path}, found {actual}")]
    WrongLineCount {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("malformed auxiliary file {path}: expected whitespace-separated `R C S` triples")]
    MalformedAuxiliaryFile { path: PathBuf },
}

/// A batch entry's exit set cannot be turned into a usable combined field. Recovered by the
/// driver: the batch entry is skipped, a placeholder is emitted, and the outer loop over exit
/// sets continues.
#[derive(Debug, Error)]
pub enum InaccessibleExit {
    /// The batch entry names no exits at all (e.g. an auxiliary-file line with zero triples, or
    /// an environment file with no `_`/exit characters under an input method that harvests exits
    /// from it).
    #[error("exit set contains no exits")]
    Empty,

    /// At least one exit in the set has no reachable orthogonal neighbor.
    #[error("exit set has an inaccessible exit")]
    Unreachable,
}
