use anyhow::Result;
use clap::Parser;
use contagion_engine::output::{save_final_grid, save_replicate_summaries, save_snapshots};
use contagion_engine::sweep::mean_outcome;
use contagion_engine::{run_outbreak, run_replicates, ContagionSimulation, SimulationConfig};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the outbreak runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config.toml file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Population density override, in percent
    #[arg(long)]
    density: Option<f64>,

    /// Animal domestication override, in percent
    #[arg(long)]
    domesticity: Option<f64>,

    /// Disease virulence override, in percent
    #[arg(long)]
    virulence: Option<f64>,

    /// RNG seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independently seeded runs
    #[arg(long)]
    replicates: Option<u32>,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = if args.config.exists() {
        SimulationConfig::load(&args.config)?
    } else {
        warn!("Config file '{}' not found; using built-in defaults.", args.config.display());
        SimulationConfig::default()
    };

    if let Some(density) = args.density {
        config.parameters.density = density;
    }
    if let Some(domesticity) = args.domesticity {
        config.parameters.domesticity = domesticity;
    }
    if let Some(virulence) = args.virulence {
        config.parameters.virulence = virulence;
    }
    if let Some(seed) = args.seed {
        config.initial_conditions.rng_seed = seed;
    }
    if let Some(replicates) = args.replicates {
        config.sweep.replicates = replicates;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting Contagion Engine...");

    let config = load_config(&args)?;
    debug!("Simulation config: {:#?}", config);
    debug!("Transition rates: {:?}", config.transition_rates());

    let start_time = Instant::now();

    if config.sweep.replicates > 1 {
        let summaries = run_replicates(&config, config.sweep.replicates)?;
        info!(
            "{} replicates finished in {:.3} seconds.",
            summaries.len(),
            start_time.elapsed().as_secs_f64()
        );
        if let Some((dead, immune, ever)) = mean_outcome(&summaries) {
            info!(
                "Mean outcome: {:.1} dead, {:.1} immune, {:.1} ever infected (of {}).",
                dead,
                immune,
                ever,
                config.population()
            );
        }
        let filename = PathBuf::from(format!("{}_replicates.csv", config.output.base_filename));
        if let Err(e) = save_replicate_summaries(&summaries, &filename) {
            error!("Error saving replicate summaries: {:#}", e);
        }
        info!("Simulation Complete.");
        return Ok(());
    }

    info!(
        "Running {}x{} grid to tick {} (seed {}).",
        config.grid.side,
        config.grid.side,
        config.timing.horizon_ticks,
        config.initial_conditions.rng_seed
    );
    let mut sim = ContagionSimulation::from_config(&config)?;
    let report = run_outbreak(&mut sim, &config.parameters, config.timing.record_interval_ticks);

    let r = &report.final_result;
    let (infection_pct, mortality_pct, immunity_pct) = r.percentages();
    info!(
        "Finished in {:.3} ms | Infected: {:.1}% | Dead: {:.1}% | Immune: {:.1}% | Total infected: {} / {}",
        start_time.elapsed().as_secs_f64() * 1000.0,
        infection_pct,
        mortality_pct,
        immunity_pct,
        r.total_ever_infected,
        r.population()
    );
    info!("Peak of {} infected at step {}.", report.peak_infected, report.peak_tick);

    // --- Save Recorded Data ---
    if config.output.save_stats {
        if let Err(e) = save_snapshots(&report.recorded, &config.output) {
            error!("Error saving snapshots: {:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if config.output.save_final_grid {
        let filename = PathBuf::from(format!("{}_final_grid.csv", config.output.base_filename));
        if let Err(e) = save_final_grid(sim.grid(), &filename) {
            error!("Error saving final grid: {:#}", e);
        }
    }

    info!("Simulation Complete.");
    Ok(())
}
