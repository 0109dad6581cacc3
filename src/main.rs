use anyhow::Result;
use clap::Parser;
use mcmc_summary::collect::{self, SummaryConfig};
use std::path::PathBuf;

/// Reduce a directory of per-gene MCMC chain samples into one summary
/// table: MAP parameters, credible intervals, convergence diagnostics,
/// posterior predictive p-values, and MAP model trajectories.
#[derive(Parser, Debug)]
#[command(name = "mcmc-summary", version)]
struct Opt {
    /// Directory holding the per-gene chain sample and posterior
    /// predictive tables
    #[arg(long, default_value = "MCMC_results")]
    results_dir: PathBuf,

    /// Gene-indexed mRNA profile table driving the model simulation
    #[arg(long)]
    mrna_profiles: PathBuf,

    /// Translation-efficiency decline profile (time, factor columns);
    /// omit for the constant-efficiency model variant
    #[arg(long)]
    te_profile: Option<PathBuf>,

    /// Initial protein level for chains that do not sample Pzero
    #[arg(long, default_value_t = collect::DEFAULT_INITIAL_PROTEIN)]
    initial_protein: f64,

    /// RK4 integration step size in hours
    #[arg(long, default_value_t = collect::DEFAULT_DT)]
    dt: f64,

    /// Output path of the summary table
    #[arg(long, short, default_value = "MCMC_summary.csv")]
    out: PathBuf,
}

fn run(opt: Opt) -> Result<()> {
    let config = SummaryConfig {
        results_dir: opt.results_dir,
        mrna_profiles: opt.mrna_profiles,
        te_profile: opt.te_profile,
        initial_protein: opt.initial_protein,
        dt: opt.dt,
    };
    let rows = collect::summarize_directory(&config)?;
    collect::write_summary(&rows, &opt.out)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();
    if let Err(err) = run(opt) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
