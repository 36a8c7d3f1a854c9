//! Fleet charging simulator entry point: CLI wiring and scenario loading.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_charge_sim::config::ScenarioConfig;
use fleet_charge_sim::sim::{KpiTracker, Simulation};

/// Electric fleet mobility and charging-coordination simulator
#[derive(Parser, Debug)]
#[command(name = "fleet-charge-sim", version)]
struct Args {
    /// Load scenario from a TOML config file
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset (oxford, small)
    #[arg(long)]
    preset: Option<String>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of ticks to run
    #[arg(long)]
    ticks: Option<usize>,

    /// Print a summary line every N ticks (0 disables)
    #[arg(long, default_value_t = 1)]
    print_every: usize,

    /// Print the final snapshot and KPI report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Serve the live simulation over HTTP instead of running a batch
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn load_scenario(args: &Args) -> ScenarioConfig {
    let loaded = match (&args.scenario, &args.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::oxford()),
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        scenario.simulation.ticks = ticks;
    }
    scenario
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let scenario = load_scenario(&args);

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let mut sim = Simulation::from_config(&scenario).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    #[cfg(feature = "api")]
    if args.serve {
        serve(sim, &scenario, args.port);
        return;
    }

    let mut kpi = KpiTracker::new(sim.tick_hours());
    for _ in 0..scenario.simulation.ticks {
        let summary = sim.tick();
        kpi.observe(&summary);
        if !args.json && args.print_every > 0 && summary.tick % args.print_every as u64 == 0 {
            println!("{summary}");
        }
    }
    let report = kpi.report();
    info!(ticks = report.ticks, "run complete");

    if args.json {
        let out = serde_json::json!({
            "snapshot": sim.snapshot(),
            "kpi": report,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("error: failed to encode JSON: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("\n{report}");
    }
}

#[cfg(feature = "api")]
fn serve(
    sim: Simulation<fleet_charge_sim::network::RoadGraph>,
    scenario: &ScenarioConfig,
    port: u16,
) {
    use std::net::SocketAddr;
    use std::time::Duration;

    use fleet_charge_sim::sim::SharedSimulation;

    let shared = SharedSimulation::new(sim);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let interval = Duration::from_millis(scenario.simulation.tick_interval_ms);

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(fleet_charge_sim::api::serve(shared, addr, interval)) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
