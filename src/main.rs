use std::fs::File;
use std::path::PathBuf;
use std::thread;
use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing_subscriber::EnvFilter;

use fwfsim::channel::TurnPolicy;
use fwfsim::common::types::DEFAULT_CHANNEL_CAPACITY;
use fwfsim::sim::{NoProgress, Simulation, SimulationConfig, TextProgress, TraceSource};

#[derive(Parser)]
#[command(author, version, about = "fwfsim - two-workload flush-window-full paging simulator")]
struct Cli {
    /// Fault-window threshold: faults tolerated since the last flush
    k: u64,

    /// Frames shared by both producers (split evenly)
    total_frames: usize,

    /// Turn quantum: references per producer turn
    q: usize,

    /// Trace replayed by producer 1
    trace1: PathBuf,

    /// Trace replayed by producer 2
    trace2: PathBuf,

    /// Log every flush and hand-off; disables the progress bar
    #[arg(long)]
    debug: bool,

    /// Slots in the request channel
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    capacity: usize,

    /// References between progress updates (0 disables them)
    #[arg(long, default_value_t = 20_000)]
    progress_interval: u64,

    /// Hand the turn to the other producer when a trace ends
    #[arg(long)]
    retire_on_exit: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Refuse to start anything if a trace cannot be read
    for path in [&cli.trace1, &cli.trace2] {
        File::open(path).with_context(|| format!("Cannot open trace file '{}'", path.display()))?;
    }

    let policy = if cli.retire_on_exit { TurnPolicy::RetireOnExit } else { TurnPolicy::Strict };
    let config = SimulationConfig::new(cli.k, cli.total_frames, cli.q)
        .with_channel_capacity(cli.capacity)
        .with_progress_interval(cli.progress_interval)
        .with_turn_policy(policy);
    let simulation = Simulation::new(config).context("Failed to set up simulation")?;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    let signal_handle = signals.handle();
    let shutdown = simulation.shutdown_handle();
    let watcher = thread::spawn(move || {
        for signal in signals.forever() {
            warn!("Caught signal {}, shutting down", signal);
            shutdown.shutdown();
        }
    });

    let sources = [TraceSource::File(cli.trace1), TraceSource::File(cli.trace2)];
    let result = if cli.debug {
        simulation.run(sources, &mut NoProgress)
    } else {
        simulation.run(sources, &mut TextProgress::stderr())
    };

    signal_handle.close();
    if watcher.join().is_err() {
        warn!("Signal watcher panicked");
    }

    let report = result.context("Simulation failed")?;
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
