use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputMethod {
    /// Walls only; exits come from the auxiliary file.
    WallsOnly = 1,
    /// Walls and exits, both from the environment file.
    WallsAndExits = 2,
    /// Walls and pedestrians; exits come from the auxiliary file.
    WallsAndPedestrians = 3,
    /// Walls, exits, and pedestrians, all from the environment file.
    Full = 4,
    /// Generate a bordered rectangle of `--lin` x `--col`; exits come from the auxiliary file.
    Generated = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputType {
    /// Per-step classification grid with pedestrians overlaid.
    Visual = 1,
    /// One integer step count per simulation.
    StepCounts = 2,
    /// Per-cell occupancy mean over the batch.
    HeatMap = 3,
}

#[derive(Debug, clap::Parser)]
#[command(version, about = "Simulates a pedestrian evacuation under the Varas (2007) cellular automaton model.")]
pub struct Args {
    /// Environment file to load (ignored for input-method 5).
    #[arg(short, long, default_value = "sala_padrao.txt")]
    pub input_file: PathBuf,

    /// Redirect output to a file; pass with no value to auto-generate its name.
    #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
    pub output_file: Option<PathBuf>,

    /// File holding one line of exit locations per batch entry.
    #[arg(short = 'a', long)]
    pub auxiliary_file: Option<PathBuf>,

    /// How to interpret `--input-file`.
    #[arg(value_enum, short = 'm', long, default_value_t = InputMethod::Full)]
    pub input_method: InputMethod,

    /// What the simulations should report.
    #[arg(value_enum, short = 'O', long, default_value_t = OutputType::Visual)]
    pub output_type: OutputType,

    /// Row count for a generated environment (input-method 5 only).
    #[arg(short, long)]
    pub lin: Option<usize>,

    /// Column count for a generated environment (input-method 5 only).
    #[arg(short, long)]
    pub col: Option<usize>,

    /// Pedestrians to place at random per simulation. Defaults to 1 if neither this flag nor
    /// `--config` sets it.
    #[arg(short, long)]
    pub ped: Option<u32>,

    /// Simulations to run per batch entry. Defaults to 1 if neither this flag nor `--config`
    /// sets it.
    #[arg(short, long)]
    pub simu: Option<u32>,

    /// Initial RNG seed; increments by one per simulation across the whole run. Defaults to 0
    /// if neither this flag nor `--config` sets it.
    #[arg(short = 'e', long)]
    pub seed: Option<u64>,

    /// Supplementary TOML configuration file; explicit CLI flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep a pedestrian on its exit cell for one extra tick before removing it.
    #[arg(long)]
    pub linger_at_exit: bool,

    /// Only move to the smallest-valued neighbor, waiting if it is occupied.
    #[arg(long)]
    pub always_smallest: bool,

    /// Forbid diagonal movement through a blocked corner.
    #[arg(long)]
    pub avoid_corner_moves: bool,

    /// Allow pedestrians to swap positions by crossing paths (disables X-swap resolution).
    #[arg(long)]
    pub allow_x_moves: bool,

    /// Dispatch a batch entry's simulations across a thread pool.
    #[arg(long)]
    pub parallel: bool,

    /// Print debug-level diagnostics.
    #[arg(short, long)]
    pub debug: bool,

    /// Print batch progress to the log.
    #[arg(long)]
    pub status: bool,

    /// Include a header naming each exit set's cells in the output.
    #[arg(long)]
    pub details: bool,
}
