//! The evacuation core: grid primitives, the static floor field, the pedestrian population, the
//! per-tick movement pipeline, and batch orchestration. Everything here is deterministic given a
//! fixed RNG seed; I/O and CLI concerns live outside this module.

pub mod driver;
pub mod environment;
pub mod exit;
pub mod grid;
pub mod movement;
pub mod pedestrian;
