use bhsim_dist::{bench_gravity, bench_workers};
use bhsim_dist::{RunConfig, Scenario};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(about = "Distributed 2D Barnes-Hut N-body simulator")]
struct Args {
    /// YAML run file; looked up in `scenarios/` when not found as given
    #[arg(short = 'f', long = "file")]
    file_name: Option<String>,

    /// Input body file
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output body file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of steps
    #[arg(short = 's', long)]
    steps: Option<usize>,

    /// Barnes-Hut opening threshold
    #[arg(short = 't', long)]
    theta: Option<f64>,

    /// Time step
    #[arg(short = 'd', long)]
    dt: Option<f64>,

    /// Number of workers in the gang
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Run the benchmark sweeps instead of a simulation
    #[arg(long)]
    bench: bool,
}

fn resolve_run_file(file_name: &str) -> PathBuf {
    let given = PathBuf::from(file_name);
    if given.exists() {
        return given;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

// load here to keep main clean
fn load_run_config(args: &Args) -> Result<RunConfig> {
    let mut cfg = match &args.file_name {
        Some(file_name) => {
            let config_path = resolve_run_file(file_name);
            let file = File::open(&config_path)
                .with_context(|| format!("opening run file {}", config_path.display()))?;
            let cfg = RunConfig::from_yaml_reader(BufReader::new(file))
                .with_context(|| format!("parsing run file {}", config_path.display()))?;
            cfg.relative_to(config_path.parent().unwrap_or(Path::new(".")))
        }
        None => RunConfig::default(),
    };

    // command-line flags win over the run file
    if args.input.is_some() {
        cfg.input = args.input.clone();
    }
    if args.output.is_some() {
        cfg.output = args.output.clone();
    }
    cfg.steps = args.steps.or(cfg.steps);
    cfg.theta = args.theta.or(cfg.theta);
    cfg.dt = args.dt.or(cfg.dt);
    cfg.workers = args.workers.or(cfg.workers);

    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.bench {
        bench_gravity();
        bench_workers();
        return Ok(());
    }

    let cfg = load_run_config(&args)?;
    let start = Instant::now();

    let scenario = Scenario::build_scenario(&cfg)?;
    scenario.run_and_save()?;

    info!("finished in {:.6} s", start.elapsed().as_secs_f64());
    Ok(())
}
