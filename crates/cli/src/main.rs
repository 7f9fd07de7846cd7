//! # roompack
//!
//! Command-line front-end for the exam-room merge optimizer.
//!
//! ## Usage
//! ```bash
//! # Optimize a CSV export and write the JSON report
//! roompack -i exams.csv -o merge_result.json
//!
//! # Force the greedy packer everywhere, with progress lines
//! roompack -i exams.csv --threshold 0 --verbose
//! ```

mod ingest;

use anyhow::Context;
use clap::Parser;
use roompack_core::{optimize, OptimizeConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "roompack",
    about = "Exam-room merge optimizer: exact MILP for small partitions, greedy bin-packing for large ones",
    version
)]
struct Cli {
    /// Input rows (.csv, or a .json array of rows).
    #[arg(short, long)]
    input: PathBuf,

    /// Output report file (JSON).
    #[arg(short, long, default_value = "merge_result.json")]
    output: PathBuf,

    /// Largest partition size still routed to the exact solver
    /// (0 forces the greedy packer everywhere).
    #[arg(long, default_value_t = 80)]
    threshold: u32,

    /// Wall-clock budget for one exact solve, in seconds.
    #[arg(long, default_value_t = 30)]
    time_limit: u32,

    /// Worker pool size (0 = number of hardware threads).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Emit progress lines; otherwise silent on success.
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "info" } else { "warn" }),
    )
    .init();

    let rows = ingest::read_rows(&cli.input)?;
    log::info!("loaded {} rows from {}", rows.len(), cli.input.display());

    let config = OptimizeConfig::default()
        .with_threshold(cli.threshold)
        .with_time_limit_secs(cli.time_limit)
        .with_workers(cli.workers);
    let report = optimize(&rows, &config)?;

    let file = File::create(&cli.output)
        .with_context(|| format!("cannot create output {}", cli.output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)
        .context("failed to write report")?;

    if cli.verbose {
        println!(
            "{} -> {} rooms (saved {}, {:.2}% efficiency); report written to {}",
            report.overall.initial_rooms,
            report.overall.final_rooms,
            report.overall.rooms_saved,
            report.overall.efficiency_percent,
            cli.output.display()
        );
    }
    Ok(())
}
