use std::path::PathBuf;
#[cfg(not(feature = "tracing"))]
use std::str::FromStr;

use clap::Parser;
use grainstats::{GrainScan, GrainStats, GrainStatsConfig, GrainStatsOutput, GrainStatsReport};

#[cfg(not(feature = "tracing"))]
use grainstats_core::init_with_level;
#[cfg(not(feature = "tracing"))]
use log::LevelFilter;
use log::{info, warn};

#[cfg(feature = "tracing")]
use grainstats_core::init_tracing;

/// Compute per-grain statistics for a labelled AFM height map.
#[derive(Debug, Parser)]
#[command(name = "grainstats", version, about)]
struct Cli {
    /// JSON run configuration.
    #[arg(short, long)]
    config: PathBuf,
    /// Override the report path from the configuration.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write each grain's plot rasters as PNG files.
    #[cfg(feature = "image")]
    #[arg(long)]
    plots: bool,
    /// One of off, error, warn, info, debug, trace.
    #[cfg(not(feature = "tracing"))]
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Emit JSON log lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    #[cfg(not(feature = "tracing"))]
    init_with_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info))?;
    #[cfg(feature = "tracing")]
    init_tracing(cli.json_logs);

    run(&cli)
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(cli)))]
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = GrainStatsConfig::load_json(&cli.config)?;
    let scan = GrainScan::load_json(&cfg.input_path)?;
    info!(
        "loaded {} ({}x{})",
        scan.image_name, scan.heights.width, scan.heights.height
    );

    let stats = GrainStats::new(cfg.params.clone())?;
    let mut report = GrainStatsReport::new(&cfg, &cli.config);

    match stats.calculate_stats(&scan.input(cfg.direction)) {
        Ok(out) => {
            info!(
                "measured {} grains, skipped {}",
                out.table.len(),
                out.skipped.len()
            );
            #[cfg(feature = "image")]
            if cli.plots {
                report.plots = write_plots(&out)?;
            }
            log_skipped(&out);
            report.set_output(out);
        }
        Err(err) => {
            warn!("grain statistics failed: {err}");
            report.set_error(err);
        }
    }

    let output_path = cli.output.clone().unwrap_or_else(|| cfg.output_path());
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());
    Ok(())
}

fn log_skipped(out: &GrainStatsOutput) {
    for s in &out.skipped {
        info!(
            "grain {} (label {}) skipped: {}",
            s.grain_number, s.label, s.reason
        );
    }
}

#[cfg(feature = "image")]
fn write_plots(out: &GrainStatsOutput) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut written = Vec::with_capacity(out.plot_data.len());
    for plot in &out.plot_data {
        std::fs::create_dir_all(&plot.output_dir)?;
        let path = plot.path("png");
        plot.data.to_gray_image().save(&path)?;
        written.push(path);
    }
    if let Some(dir) = out.plot_data.first().map(|p| p.output_dir.as_path()) {
        info!("wrote {} plots under {}", written.len(), dir.display());
    }
    Ok(written)
}
