use anyhow::Result;
use clap::Parser;
use protosim_core::metrics::init_logging;
use protosim_lib::app::{load_config, HeadlessRunner, ProgramKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "protosim.toml")]
    config: PathBuf,

    /// Maximum number of ticks to run (overrides `run.ticks`)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed (overrides `engine.seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Program every device runs (overrides `[program]`)
    #[arg(short, long, value_enum)]
    program: Option<ProgramKind>,

    /// Write JSON-lines state dumps to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Ticks between state dumps
    #[arg(long)]
    dump_period: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.sim.engine.seed = Some(seed);
    }
    if let Some(kind) = args.program {
        config.program = kind.program();
    }
    if let Some(path) = args.dump {
        config.run.dump_path = Some(path);
    }
    if let Some(period) = args.dump_period {
        anyhow::ensure!(period > 0, "--dump-period must be positive");
        config.run.dump_period = period;
    }
    let ticks = args.ticks.unwrap_or(config.run.ticks);

    tracing::info!(
        devices = config.sim.population.size,
        ticks,
        program = ?config.program,
        "Running headless simulation"
    );
    let mut runner = HeadlessRunner::new(config)?;
    let summary = runner.run(ticks)?;

    println!(
        "Simulation finished: {} ticks, time {:.3}, {} devices ({:?})",
        summary.ticks,
        summary.time,
        runner.engine().len(),
        summary.reason
    );
    Ok(())
}
