use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;

use intersection_sim::enforcement::{ChallanLedger, FineSchedule, TicketWorker, ViolationQueue};
use intersection_sim::simulation::{SimConfig, SignalConfig, SimWorld};

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Signalized intersection simulation with speed enforcement")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Full signal cycle length in seconds
    #[arg(long, default_value = "20.0")]
    cycle: f32,

    /// Yellow phase length in seconds
    #[arg(long, default_value = "3.0")]
    yellow: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = SimConfig {
        signal: SignalConfig {
            cycle_secs: cli.cycle,
            yellow_secs: cli.yellow,
        },
        ..SimConfig::default()
    };

    let queue = Arc::new(ViolationQueue::new());
    let ledger = Arc::new(ChallanLedger::new());
    let worker = TicketWorker::spawn(
        Arc::clone(&queue),
        Arc::clone(&ledger),
        FineSchedule::default(),
    )?;

    let mut world = match cli.seed {
        Some(seed) => SimWorld::with_seed(config, Arc::clone(&queue), seed),
        None => SimWorld::new(config, Arc::clone(&queue)),
    };

    println!("Running intersection simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);
    println!();

    // Report roughly every 10 seconds of simulated time
    let report_every = (((10.0 / cli.delta).ceil() as u32).max(1)).min(cli.ticks.max(1));
    for tick in 1..=cli.ticks {
        world.tick(cli.delta);
        if tick % report_every == 0 {
            print_summary(&world);
        }
    }

    // Joining also drains whatever the detector queued this run
    let issued = worker.shutdown()?;

    println!("=== Final State ===");
    print_summary(&world);
    println!("Challans issued: {}", issued);
    println!("Ledger entries: {}", ledger.len());
    info!("simulation finished after {:.1}s of sim time", world.time());
    Ok(())
}

fn print_summary(world: &SimWorld) {
    let stats = world.stats();
    let snapshot = world.snapshot();
    println!(
        "--- t={:.1}s | lights NS {:?} / EW {:?} ---",
        snapshot.time, snapshot.north_south, snapshot.east_west
    );
    println!(
        "Vehicles: {} on scene | {} spawned | {} admitted | {} turned | {} departed",
        snapshot.vehicles.len(),
        stats.spawned,
        stats.admitted,
        stats.turned,
        stats.pruned
    );
    println!("Violations detected: {}", stats.violations);
    println!();
}
