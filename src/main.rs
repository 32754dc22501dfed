//! Command-line entry point: `workpool-bench <routines> <logging>`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, warn};

use workpool_bench::builders::build_manager_with_faults;
use workpool_bench::config::{BenchConfig, BenchOverrides, StoreConfig};
use workpool_bench::core::AppResult;
use workpool_bench::infra::store::{default_seed, load_seed_file, FaultPlan};
use workpool_bench::runtime::run_benchmark;
use workpool_bench::util::{init_tracing, logging_switch};

/// Measure throughput and saturation of a bounded worker pool.
#[derive(Debug, Parser)]
#[command(name = "workpool-bench", version, about)]
struct Cli {
    /// Number of pool executors.
    routines: usize,

    /// Logging switch: any value containing "on" enables logging.
    logging: String,

    /// Units submitted per trial [default: 100].
    #[arg(long)]
    work: Option<usize>,

    /// Number of timed trials [default: 5].
    #[arg(long)]
    trials: Option<usize>,

    /// Backlog capacity [default: units per trial].
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// JSON file with run settings; arguments given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON seed file for the record store (`{"collection": [docs]}`).
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Simulated store latency per query, in milliseconds.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Print the report as JSON instead of text lines.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> BenchOverrides {
        BenchOverrides {
            routines: Some(self.routines),
            amount_of_work: self.work,
            trials: self.trials,
            queue_capacity: self.queue_capacity,
            logging: logging_switch(&self.logging),
        }
    }

    fn bench_config(&self) -> AppResult<BenchConfig> {
        let base = match &self.config {
            Some(path) => {
                let input = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                BenchConfig::from_json_str(&input).map_err(anyhow::Error::msg)?
            }
            None => BenchConfig::new(self.routines),
        };
        self.overrides().apply(base).map_err(anyhow::Error::msg)
    }
}

fn run(cli: &Cli, cfg: &BenchConfig) -> AppResult<()> {
    let store_cfg = StoreConfig::from_env().map_err(anyhow::Error::msg)?;
    let seed = match &cli.seed {
        Some(path) => load_seed_file(path)?,
        None => default_seed(),
    };
    let faults = FaultPlan::default().with_latency(Duration::from_millis(cli.latency_ms));

    let manager = build_manager_with_faults(cfg, &store_cfg, seed, faults).context("starting work manager")?;

    let result = run_benchmark(&manager, cfg, |trial| {
        if !cli.json {
            println!("{trial}");
        }
    });

    if let Err(e) = manager.shutdown() {
        warn!(error = %e, "Shutdown reported an error");
    }

    let report = result?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Average[{:.6}]", report.average_secs);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let cfg = cli.bench_config();
    init_tracing(cfg.as_ref().map_or_else(|_| logging_switch(&cli.logging), |cfg| cfg.logging));

    let outcome = cfg.and_then(|cfg| run(&cli, &cfg));
    if let Err(e) = outcome {
        error!("Benchmark failed: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
