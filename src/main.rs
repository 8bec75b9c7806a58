//! Speckle vibration extraction CLI
//!
//! Reads a frame sequence from image files (or generates a synthetic one),
//! extracts one displacement trace per speckle and reports a summary,
//! optionally writing a JSON report and Prometheus metrics.

use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use speckle_vib::{
    capture::{collect_frames, Frame, ImageSequence, SourceError, SyntheticSpeckle},
    config::{ConfigError, FileConfig},
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    pipeline::{FrameReport, FrameStatus, PipelineResult, VibrationExtractor},
    spectrum::{SpectralPeak, SpectrumAnalyzer},
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image files, or a single directory of images, in frame order
    frames: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate this many synthetic frames instead of reading images
    #[arg(long)]
    synthetic: Option<usize>,

    /// Write a JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,

    /// Process frames on the calling thread only
    #[arg(long)]
    sequential: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("no input frames: pass image paths or --synthetic N")]
    NoInput,
    #[error("failed to write report {path}: {reason}")]
    Report { path: String, reason: String },
}

/// Per-speckle entry of the JSON report.
#[derive(Debug, Serialize)]
struct SpeckleSummary<'a> {
    index: usize,
    samples: usize,
    rms: f64,
    main_frequency: Option<SpectralPeak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a [f64]>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    version: &'static str,
    generated_at: DateTime<Utc>,
    speckle_count: usize,
    elapsed_s: f64,
    sample_period_s: f64,
    samples_per_frame: usize,
    frames: &'a [FrameReport],
    speckles: Vec<SpeckleSummary<'a>>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("Speckle vibration extractor v{}", speckle_vib::VERSION);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if args.sequential {
        config.pipeline.parallel = false;
    }

    let frames = load_frames(&args, &config)?;
    info!("Loaded {} frames", frames.len());

    let extractor = VibrationExtractor::new(config.pipeline.clone())?;
    let result = extractor.run(&frames);

    info!(
        "Processed {} frames in {:.3}s: {} extracted, {} skipped, {} failed",
        result.frames.len(),
        result.elapsed.as_secs_f64(),
        result.count(FrameStatus::Extracted),
        result.count(FrameStatus::Skipped),
        result.count(FrameStatus::Failed)
    );
    if result.is_empty() {
        warn!("No speckles detected in any frame");
    }

    let spectrum = SpectrumAnalyzer::from_config(&config.output);
    let summaries = summarize(&result, &spectrum, config.output.include_traces);
    for summary in &summaries {
        match summary.main_frequency {
            Some(peak) => println!(
                "speckle {}: {} samples, rms {:.4} px, main frequency {:.1} Hz ({:.4} px)",
                summary.index, summary.samples, summary.rms, peak.frequency_hz, peak.amplitude
            ),
            None => println!(
                "speckle {}: {} samples, rms {:.4} px, no spectral peak in band",
                summary.index, summary.samples, summary.rms
            ),
        }
    }

    if let Some(path) = &args.output {
        write_report(path, &result, summaries)?;
        info!("Report written to {}", path.display());
    }

    if args.metrics {
        let registry = MetricsRegistry::new()?;
        registry.record(&MetricsSnapshot::from_result(&result));
        print!("{}", registry.encode()?);
    }

    Ok(())
}

fn load_frames(args: &Args, config: &FileConfig) -> Result<Vec<Frame>, CliError> {
    if let Some(count) = args.synthetic {
        let mut synthetic = config.synthetic.clone();
        synthetic.frames = count;
        synthetic.sample_period_s = config.pipeline.sample_period_s;
        synthetic.frame_period_s = config.pipeline.frame_period_s;
        return Ok(collect_frames(&mut SyntheticSpeckle::new(synthetic))?);
    }

    let mut source = match args.frames.as_slice() {
        [] => return Err(CliError::NoInput),
        [dir] if dir.is_dir() => ImageSequence::from_dir(dir)?,
        paths => ImageSequence::from_paths(paths.to_vec()),
    };
    info!("Reading frames from {} files", source.paths().len());
    Ok(collect_frames(&mut source)?)
}

fn summarize<'a>(
    result: &'a PipelineResult,
    spectrum: &SpectrumAnalyzer,
    include_traces: bool,
) -> Vec<SpeckleSummary<'a>> {
    result
        .traces
        .iter()
        .enumerate()
        .map(|(index, trace)| {
            let rms = if trace.is_empty() {
                0.0
            } else {
                (trace.iter().map(|v| v * v).sum::<f64>() / trace.len() as f64).sqrt()
            };
            SpeckleSummary {
                index,
                samples: trace.len(),
                rms,
                main_frequency: spectrum.dominant(trace, result.sample_period_s),
                trace: include_traces.then_some(trace.as_slice()),
            }
        })
        .collect()
}

fn write_report(
    path: &Path,
    result: &PipelineResult,
    speckles: Vec<SpeckleSummary<'_>>,
) -> Result<(), CliError> {
    let report = Report {
        version: speckle_vib::VERSION,
        generated_at: Utc::now(),
        speckle_count: result.speckle_count,
        elapsed_s: result.elapsed.as_secs_f64(),
        sample_period_s: result.sample_period_s,
        samples_per_frame: result.samples_per_frame,
        frames: &result.frames,
        speckles,
    };

    let failed = |reason: String| CliError::Report {
        path: path.display().to_string(),
        reason,
    };
    let file = File::create(path).map_err(|e| failed(e.to_string()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report).map_err(|e| failed(e.to_string()))
}
