use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rsf_sim::output::{
    trajectory_filename, write_manifest_json, write_sweep_summary_csv, write_trajectory_csv,
    Manifest,
};
use rsf_sim::sweep::NoiseKind;
use rsf_sim::{run_sweep, Scheme, SweepConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rsf_sweep")]
#[command(about = "Rate-and-state friction sweep over the critical slip distance")]
struct Cli {
    /// TOML sweep configuration; defaults reproduce the reference sweep
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "output-rsf-sweep")]
    outdir: PathBuf,

    #[arg(long)]
    seed: Option<u64>,

    /// recurrence | rk4
    #[arg(long)]
    scheme: Option<Scheme>,

    #[arg(long)]
    num_dc: Option<usize>,

    #[arg(long)]
    dc_min: Option<f64>,

    #[arg(long)]
    dc_max: Option<f64>,

    /// Disable observation noise
    #[arg(long, default_value_t = false)]
    zero_noise: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(error) = run(Cli::parse()) {
        eprintln!("rsf sweep failed: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SweepConfig::from_toml_path(path)
            .with_context(|| format!("failed to load sweep config: {}", path.display()))?,
        None => SweepConfig::default(),
    };

    if let Some(v) = cli.seed {
        config.seed = v;
    }
    if let Some(v) = cli.scheme {
        config.scheme = v;
    }
    if let Some(v) = cli.num_dc {
        config.num_dc = v;
    }
    if let Some(v) = cli.dc_min {
        config.dc_min = v;
    }
    if let Some(v) = cli.dc_max {
        config.dc_max = v;
    }
    if cli.zero_noise {
        config.noise = NoiseKind::Zero;
    }

    let runs = run_sweep(&config).context("invalid sweep configuration")?;

    fs::create_dir_all(&cli.outdir).with_context(|| {
        format!("failed to create output directory: {}", cli.outdir.display())
    })?;

    for run in &runs {
        if let Some(trajectory) = run.trajectory() {
            let path = cli.outdir.join(trajectory_filename(run.index));
            let file = File::create(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            write_trajectory_csv(BufWriter::new(file), trajectory)?;
        }
    }

    let summary_path = cli.outdir.join("sweep_summary.csv");
    write_sweep_summary_csv(File::create(&summary_path)?, &runs)?;

    let manifest_path = cli.outdir.join("manifest.json");
    write_manifest_json(File::create(&manifest_path)?, &Manifest::new(&config, &runs))?;

    println!("Sweep complete ({} scheme)", config.scheme);
    for run in &runs {
        match &run.outcome {
            Ok(trajectory) => println!(
                "  Dc = {:>8.2} um | ok     | peak |acc| {:.6} | rms acc {:.6}",
                run.dc,
                trajectory.peak_abs_acc(),
                trajectory.rms_acc()
            ),
            Err(err) => println!("  Dc = {:>8.2} um | failed | {err}", run.dc),
        }
    }
    println!("Summary: {}", summary_path.display());
    println!("Manifest: {}", manifest_path.display());

    Ok(())
}
