use std::fs::File;
use std::io::{stdout, BufWriter, IsTerminal, Write};

use clap::Parser;
use log::{info, warn, LevelFilter};

use varas_evac::args::{self, Args};
use varas_evac::config::{Config, FileConfig};
use varas_evac::error::CoreError;
use varas_evac::io::{env_file, exits_file, output};
use varas_evac::simulator::{
    driver::{self, DriverConfig, SeedCursor},
    environment::Environment,
    exit::ExitSet,
    grid::Cell,
    pedestrian::Population,
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let debug = args.debug;

    env_logger::builder()
        .filter_module("varas_evac", if debug { LevelFilter::Debug } else { LevelFilter::Info })
        .init();

    let file_config = match &args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    match run(args, file_config) {
        Ok(()) => Ok(()),
        Err(err) => {
            log::error!("{err:#}");
            match err.downcast_ref::<CoreError>() {
                Some(CoreError::Config(_)) => std::process::exit(2),
                Some(_) => std::process::exit(1),
                None => std::process::exit(1),
            }
        }
    }
}

fn run(args: Args, file_config: Option<FileConfig>) -> anyhow::Result<()> {
    let config = Config::from_args(args, file_config).map_err(CoreError::Config)?;

    // Only clear the screen between visual frames when stdout is an actual interactive
    // terminal; a redirected or piped stdout is treated like any other file target.
    let clear_between_frames = config.output_file.is_none() && stdout().is_terminal();

    let mut out: Box<dyn Write> = match &config.output_file {
        None => Box::new(stdout()),
        Some(path) if path.as_os_str().is_empty() => {
            let path = output::auto_named_path(&config.input_file)?;
            info!("writing output to {}", path.display());
            Box::new(BufWriter::new(File::create(path)?))
        }
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
    };

    let (environment, template_population) = load_environment(&config)?;

    let mut batch_entries: Vec<Vec<Vec<Cell>>> = Vec::new();
    if config.exits_from_auxiliary() {
        let path = config.auxiliary_file.as_ref().expect("validated by Config::from_args");
        batch_entries = exits_file::load(path).map_err(CoreError::Environment)?;
    } else {
        batch_entries.push(environment.flood_fill_exits());
    }

    let total_entries = batch_entries.len();
    let mut seed_cursor = SeedCursor::new(config.seed);

    for (entry_index, exit_groups) in batch_entries.into_iter().enumerate() {
        let shape = environment.shape;
        let mut exits = ExitSet::new(shape);
        for group in &exit_groups {
            let mut cells = group.iter();
            if let Some(&first) = cells.next() {
                exits.add_exit(shape, first);
                for &cell in cells {
                    exits.expand_last(cell);
                }
            }
        }

        let seed_base = seed_cursor.take(config.num_simulations);

        if matches!(config.output_type, args::OutputType::Visual) {
            match exits.build(&environment) {
                Ok(()) => {
                    if config.details {
                        output::render_header(&mut out, &exits)?;
                    }
                    run_batch_visual(
                        &config,
                        &environment,
                        &exits,
                        &template_population,
                        seed_base,
                        clear_between_frames,
                        &mut out,
                    )?;
                }
                Err(_) => {
                    if config.details {
                        output::render_header(&mut out, &exits)?;
                    }
                    output::render_inaccessible_notice(&mut out)?;
                }
            }
        } else {
            let driver_config = DriverConfig {
                num_simulations: config.num_simulations,
                num_pedestrians: config.num_pedestrians,
                movement: config.movement,
                parallel: config.parallel,
                explicit_placement: config.explicit_placement(),
            };

            match driver::run_batch(&environment, &mut exits, &template_population, seed_base, &driver_config) {
                Ok(result) => {
                    if config.details {
                        output::render_header(&mut out, &exits)?;
                    }

                    match config.output_type {
                        args::OutputType::StepCounts => {
                            output::render_step_counts(&mut out, &result.step_counts)?;
                        }
                        args::OutputType::HeatMap => {
                            output::render_heat_map(&mut out, &result.heat_map, config.num_simulations)?;
                        }
                        args::OutputType::Visual => unreachable!("handled above"),
                    }
                }
                Err(_) => {
                    if config.details {
                        output::render_header(&mut out, &exits)?;
                    }
                    match config.output_type {
                        args::OutputType::StepCounts => {
                            output::render_inaccessible_step_counts(&mut out, config.num_simulations)?;
                        }
                        _ => {
                            output::render_inaccessible_notice(&mut out)?;
                        }
                    }
                }
            }
        }

        if config.status {
            info!("exit set {}/{}", entry_index + 1, total_entries);
        }

        if config.single_batch_entry() {
            break;
        }
    }

    out.flush()?;
    Ok(())
}

/// Drives the visual output type: one simulation at a time, printing the grid before ticking
/// and after each tick, matching the donor's inline rendering loop. Never parallelized — frames
/// only make sense in the order a single simulation produces them.
fn run_batch_visual(
    config: &Config,
    environment: &Environment,
    exits: &ExitSet,
    template_population: &Population,
    seed_base: u64,
    clear_between_frames: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    use varas_evac::simulator::movement;

    for sim_index in 0..config.num_simulations {
        let mut rng = fastrand::Rng::with_seed(seed_base + sim_index as u64);
        let mut population = template_population.clone();
        let mut heat_map = environment.shape.zeros_u64();

        if config.explicit_placement() {
            population.reset_to_origin();
        } else {
            population.random_place(config.num_pedestrians, exits, &mut heat_map, &mut rng);
        }

        writeln!(out, "Simulação {sim_index}")?;
        output::render_tick(out, &population, exits)?;

        let mut step = 0u32;
        while !population.is_empty() && !population.all_left() {
            if clear_between_frames {
                output::clear_screen(out)?;
            }
            writeln!(out, "Passo {step}")?;
            movement::tick(&mut population, exits, &mut heat_map, &config.movement, &mut rng);
            output::render_tick(out, &population, exits)?;
            step += 1;
        }
    }

    Ok(())
}

fn load_environment(config: &Config) -> anyhow::Result<(Environment, Population)> {
    use args::InputMethod;

    let environment = match config.input_method {
        InputMethod::Generated => {
            let rows = config.lin.expect("validated by Config::from_args");
            let cols = config.col.expect("validated by Config::from_args");
            Environment::bordered_rectangle(rows, cols)
        }
        InputMethod::WallsOnly | InputMethod::WallsAndPedestrians => {
            env_file::load(&config.input_file, env_file::ExitHandling::TreatAsWall).map_err(CoreError::Environment)?
        }
        InputMethod::WallsAndExits | InputMethod::Full => {
            env_file::load(&config.input_file, env_file::ExitHandling::LoadFromFile).map_err(CoreError::Environment)?
        }
    };

    let shape = environment.shape;
    let mut population = Population::new(shape.rows, shape.cols);
    if config.explicit_placement() {
        let mut heat_map = shape.zeros_u64();
        for &cell in &environment.pedestrian_spawns {
            population.place(cell, &mut heat_map);
        }
        if population.is_empty() {
            warn!("input method expects pedestrians in the environment file, but none were marked");
        }
    }

    Ok((environment, population))
}
