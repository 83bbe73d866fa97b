use std::io::Write;

use csv::Writer;
use serde::Serialize;

use crate::sim::Trajectory;
use crate::sweep::{SweepConfig, SweepRun};
use crate::RsfError;

pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// Machine-readable description of a sweep's output files
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    pub scheme: String,
    pub seed: u64,
    pub dc_values: Vec<f64>,
    pub trajectory_files: Vec<String>,
    pub failed_dc_values: Vec<f64>,
}

impl Manifest {
    pub fn new(config: &SweepConfig, runs: &[SweepRun]) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            scheme: config.scheme.to_string(),
            seed: config.seed,
            dc_values: runs.iter().map(|run| run.dc).collect(),
            trajectory_files: runs
                .iter()
                .filter(|run| run.is_ok())
                .map(|run| trajectory_filename(run.index))
                .collect(),
            failed_dc_values: runs
                .iter()
                .filter(|run| !run.is_ok())
                .map(|run| run.dc)
                .collect(),
        }
    }
}

pub fn trajectory_filename(index: usize) -> String {
    format!("trajectory_dc_{index:03}.csv")
}

fn ensure_len(context: &'static str, expected: usize, actual: usize) -> Result<(), RsfError> {
    if expected == actual {
        return Ok(());
    }

    Err(RsfError::LengthMismatch {
        context,
        expected,
        got: actual,
    })
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

/// Write `t, acc, acc_noise` rows
pub fn write_trajectory_csv<W: Write>(writer: W, trajectory: &Trajectory) -> Result<(), RsfError> {
    let n = trajectory.t.len();
    ensure_len("trajectory acc", n, trajectory.acc.len())?;
    ensure_len("trajectory acc_noise", n, trajectory.acc_noise.len())?;

    let mut writer = Writer::from_writer(writer);
    writer.write_record(["t", "acc", "acc_noise"])?;

    for idx in 0..n {
        writer.write_record([
            fmt_f64(trajectory.t[idx]),
            fmt_f64(trajectory.acc[idx]),
            fmt_f64(trajectory.acc_noise[idx]),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// One row per Dc value with status and acceleration statistics
pub fn write_sweep_summary_csv<W: Write>(writer: W, runs: &[SweepRun]) -> Result<(), RsfError> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(["dc", "status", "steps", "peak_abs_acc", "rms_acc", "error"])?;

    for run in runs {
        let row = match &run.outcome {
            Ok(trajectory) => [
                fmt_f64(run.dc),
                run.status().to_string(),
                trajectory.len().to_string(),
                fmt_f64(trajectory.peak_abs_acc()),
                fmt_f64(trajectory.rms_acc()),
                String::new(),
            ],
            Err(err) => [
                fmt_f64(run.dc),
                run.status().to_string(),
                String::new(),
                String::new(),
                String::new(),
                err.to_string(),
            ],
        };
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_manifest_json<W: Write>(writer: W, manifest: &Manifest) -> Result<(), RsfError> {
    serde_json::to_writer_pretty(writer, manifest)?;
    Ok(())
}
