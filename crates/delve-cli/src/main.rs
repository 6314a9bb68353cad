//! delve: grow a dungeon map from a seed, unattended.
//!
//! Thin driver around delve-core: parse arguments, configure logging,
//! build or load the starting map, run the requested number of steps, and
//! optionally write the result back out.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use delve_core::generator::{DungeonGenerator, StepOutcome};
use delve_core::geometry::Bias;
use delve_core::map::DungeonMap;
use delve_core::save;

/// Procedural dungeon-map generator
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Grow a dungeon map from a seed", long_about = None)]
struct Args {
    /// Seed for the random stream (auto-generated and reported if unset)
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Load the starting map from a file instead of beginning fresh
    #[arg(short = 'l', long = "load")]
    load: Option<PathBuf>,

    /// Number of generation steps to run
    #[arg(short = 'n', long = "steps", default_value_t = 50)]
    steps: u32,

    /// Lay junction exits out clockwise instead of counterclockwise
    #[arg(long = "right-bias")]
    right_bias: bool,

    /// Write the finished map to a file
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("delve: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let map = match &args.load {
        Some(path) => {
            let mut map = save::load_from_path(path)
                .map_err(|e| format!("could not load {}: {e}", path.display()))?;
            map.flush();
            println!("Loaded map: {}", map.summary());
            map
        }
        None => DungeonMap::new(),
    };

    let bias = if args.right_bias { Bias::Right } else { Bias::Left };
    let mut generator =
        DungeonGenerator::new(map, args.seed, bias).map_err(|e| e.to_string())?;
    println!("Random seed is {}", generator.seed());

    for _ in 0..args.steps {
        match generator.step().map_err(|e| e.to_string())? {
            StepOutcome::Grew { new_frontiers, .. } => {
                log::info!(
                    "step {}: grew ({} new frontier stubs, {} open)",
                    generator.step_index(),
                    new_frontiers,
                    generator.frontier_len()
                );
            }
            StepOutcome::DeadEnd { .. } => {
                log::info!(
                    "step {}: dead end pruned ({} frontiers left)",
                    generator.step_index(),
                    generator.frontier_len()
                );
            }
            StepOutcome::MapComplete => {
                println!("Map complete after {} steps.", generator.step_index() - 1);
                break;
            }
        }
    }

    let map = generator.into_map();
    println!("{}", map.summary());

    if let Some(path) = &args.out {
        save::save_to_path(&map, path)
            .map_err(|e| format!("could not write {}: {e}", path.display()))?;
        println!("Wrote map to {}", path.display());
    }
    Ok(())
}
