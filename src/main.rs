use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use pulse_recover::batch::BatchProcessor;
use pulse_recover::config::RecoverConfig;
use pulse_recover::manifest::read_manifest;
use pulse_recover::output::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "pulse-recover")]
#[command(about = "Recover clipped discharge pulse amplitudes by double-pulse model fitting")]
struct Args {
    /// Peak manifest (filename, peak_index, plateau_length per line)
    #[arg(short, long, default_value = "cut_peaks_positions.txt")]
    manifest: PathBuf,

    /// Directory the manifest filenames are resolved against
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory for plots and the summary report
    #[arg(short, long, default_value = "plots")]
    plots_dir: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Savitzky-Golay window length for tail smoothing
    #[arg(short, long)]
    window_length: Option<usize>,

    /// Absolute amplitude tolerance for the restored classification
    #[arg(long)]
    restore_tolerance: Option<f64>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Skip rendering plots
    #[arg(long)]
    no_plots: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => RecoverConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RecoverConfig::default(),
    };
    if let Some(window_length) = args.window_length {
        config.approximator.window_length = window_length;
    }
    if let Some(tolerance) = args.restore_tolerance {
        config.batch.restore_tolerance = tolerance;
    }
    config.validate().context("Invalid configuration")?;

    fs::create_dir_all(&args.plots_dir).context("Failed to create plots directory")?;

    let entries = read_manifest(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;

    let processor = BatchProcessor::new(config);
    let report = processor.process(&entries, &args.data_dir);
    let stats_path = args.plots_dir.join(&processor.config().batch.stats_filename);

    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }
    for record in &report.records {
        println!("{}", formatter.format(record));
    }

    if !args.no_plots {
        render_plots(&report.records, &args.plots_dir);
    }

    report
        .summary
        .write_summary(&stats_path)
        .with_context(|| format!("Failed to write {}", stats_path.display()))?;

    println!(
        "Done. Non-restored: {}, Restored: {}",
        report.summary.non_restored, report.summary.restored
    );
    Ok(())
}

#[cfg(feature = "plot")]
fn render_plots(records: &[pulse_recover::PulseRecord], plots_dir: &std::path::Path) {
    use rayon::prelude::*;

    records.par_iter().for_each(|record| {
        if let Err(e) = pulse_recover::plot::plot_record(record, plots_dir) {
            log::warn!("Failed to plot {}: {}", record.filename, e);
        }
    });
}

#[cfg(not(feature = "plot"))]
fn render_plots(_records: &[pulse_recover::PulseRecord], _plots_dir: &std::path::Path) {
    log::info!("Built without the plot feature, skipping plots");
}
