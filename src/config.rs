//! Validated run configuration: CLI args, optionally layered under a TOML file, reduced to the
//! typed object the rest of the program consumes. `Config::from_args` is the only place §6's
//! cross-field rules (which input methods need an auxiliary file, which need explicit
//! dimensions) are enforced.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::args::{Args, InputMethod, OutputType};
use crate::error::ConfigError;
use crate::simulator::movement::MovementConfig;

/// Supplementary TOML configuration. Every field is optional; a field present here only fills
/// in for a CLI option that was left at its clap default — an explicit CLI flag always wins.
/// This is additive to the donor crate's own scenario-file pattern, not a replacement for it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub auxiliary_file: Option<PathBuf>,
    pub lin: Option<usize>,
    pub col: Option<usize>,
    pub ped: Option<u32>,
    pub simu: Option<u32>,
    pub seed: Option<u64>,
    pub linger_at_exit: Option<bool>,
    pub always_smallest: Option<bool>,
    pub avoid_corner_moves: Option<bool>,
    pub allow_x_moves: Option<bool>,
    pub parallel: Option<bool>,
    pub debug: Option<bool>,
    pub status: Option<bool>,
    pub details: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_file: PathBuf,
    /// `None`: write to stdout. `Some(path)` where `path` is empty: redirect with an
    /// auto-generated name. `Some(path)` otherwise: redirect to that path.
    pub output_file: Option<PathBuf>,
    pub auxiliary_file: Option<PathBuf>,
    pub input_method: InputMethod,
    pub output_type: OutputType,
    pub lin: Option<usize>,
    pub col: Option<usize>,
    pub num_pedestrians: u32,
    pub num_simulations: u32,
    pub seed: u64,
    pub movement: MovementConfig,
    pub parallel: bool,
    pub debug: bool,
    pub status: bool,
    pub details: bool,
}

impl Config {
    /// Validates `args`, layering `file` underneath any field the CLI left unset.
    pub fn from_args(args: Args, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let auxiliary_file = args.auxiliary_file.or(file.auxiliary_file);
        let lin = args.lin.or(file.lin);
        let col = args.col.or(file.col);
        let num_pedestrians = args.ped.or(file.ped).unwrap_or(1);
        let num_simulations = args.simu.or(file.simu).unwrap_or(1);
        let seed = args.seed.or(file.seed).unwrap_or(0);

        let requires_auxiliary = matches!(
            args.input_method,
            InputMethod::WallsOnly | InputMethod::WallsAndPedestrians | InputMethod::Generated
        );
        if requires_auxiliary && auxiliary_file.is_none() {
            return Err(ConfigError::MissingAuxiliaryFile { method: args.input_method as u8 });
        }

        if args.input_method == InputMethod::Generated && (lin.is_none() || col.is_none()) {
            return Err(ConfigError::MissingGridDimensions);
        }

        if num_simulations < 1 {
            return Err(ConfigError::InvalidSimulationCount(num_simulations));
        }
        if num_pedestrians < 1 {
            return Err(ConfigError::InvalidPedestrianCount(num_pedestrians));
        }
        if args.input_method == InputMethod::Generated {
            let (rows, cols) = (lin.unwrap(), col.unwrap());
            if rows < 3 || cols < 3 {
                return Err(ConfigError::GridTooSmall { rows, cols });
            }
        }

        Ok(Config {
            input_file: args.input_file.clone().or(file.input_file).unwrap_or(args.input_file),
            output_file: args.output_file.or(file.output_file),
            auxiliary_file,
            input_method: args.input_method,
            output_type: args.output_type,
            lin,
            col,
            num_pedestrians,
            num_simulations,
            seed,
            movement: MovementConfig {
                linger_at_exit: args.linger_at_exit || file.linger_at_exit.unwrap_or(false),
                always_smallest: args.always_smallest || file.always_smallest.unwrap_or(false),
                avoid_corner_moves: args.avoid_corner_moves || file.avoid_corner_moves.unwrap_or(false),
                allow_x_moves: args.allow_x_moves || file.allow_x_moves.unwrap_or(false),
            },
            parallel: args.parallel || file.parallel.unwrap_or(false),
            debug: args.debug || file.debug.unwrap_or(false),
            status: args.status || file.status.unwrap_or(false),
            details: args.details || file.details.unwrap_or(false),
        })
    }

    /// Whether this input method sources exit locations from the auxiliary file rather than
    /// the environment file.
    pub fn exits_from_auxiliary(&self) -> bool {
        requires_auxiliary(self.input_method)
    }

    /// Whether this input method places pedestrians explicitly (from the environment file)
    /// rather than at random.
    pub fn explicit_placement(&self) -> bool {
        matches!(self.input_method, InputMethod::WallsAndPedestrians | InputMethod::Full)
    }

    /// Whether this batch has only a single exit set (the environment's own), so the driver
    /// should not loop over further auxiliary-file lines.
    pub fn single_batch_entry(&self) -> bool {
        matches!(self.input_method, InputMethod::WallsAndExits | InputMethod::Full)
    }
}

fn requires_auxiliary(method: InputMethod) -> bool {
    matches!(
        method,
        InputMethod::WallsOnly | InputMethod::WallsAndPedestrians | InputMethod::Generated
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        use clap::Parser;
        Args::parse_from(["varas-evac"])
    }

    #[test]
    fn generated_method_without_dimensions_is_rejected() {
        let mut args = base_args();
        args.input_method = InputMethod::Generated;
        args.auxiliary_file = Some(PathBuf::from("aux.txt"));

        let result = Config::from_args(args, None);
        assert!(matches!(result, Err(ConfigError::MissingGridDimensions)));
    }

    #[test]
    fn walls_only_without_auxiliary_file_is_rejected() {
        let mut args = base_args();
        args.input_method = InputMethod::WallsOnly;

        let result = Config::from_args(args, None);
        assert!(matches!(result, Err(ConfigError::MissingAuxiliaryFile { .. })));
    }

    #[test]
    fn zero_pedestrians_is_rejected() {
        let mut args = base_args();
        args.ped = Some(0);

        let result = Config::from_args(args, None);
        assert!(matches!(result, Err(ConfigError::InvalidPedestrianCount(0))));
    }

    #[test]
    fn file_config_fills_in_unset_cli_fields() {
        let args = base_args();
        let file = FileConfig {
            simu: Some(50),
            ..FileConfig::default()
        };

        let config = Config::from_args(args, Some(file)).unwrap();
        assert_eq!(config.num_simulations, 50);
    }

    #[test]
    fn explicit_cli_flag_overrides_file_config_even_at_the_default_value() {
        let mut args = base_args();
        args.ped = Some(1);
        let file = FileConfig {
            ped: Some(50),
            ..FileConfig::default()
        };

        let config = Config::from_args(args, Some(file)).unwrap();
        assert_eq!(config.num_pedestrians, 1);
    }
}
