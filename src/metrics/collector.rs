//! Metrics collection and registry.

use crate::pipeline::{FrameStatus, PipelineResult};
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed inside Prometheus.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Counts and timings of one extraction batch.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames that produced traces.
    pub frames_extracted: u64,
    /// Frames skipped for lack of speckles or row bands.
    pub frames_skipped: u64,
    /// Frames that failed extraction.
    pub frames_failed: u64,
    /// Speckle slots with a trace.
    pub speckles: usize,
    /// Samples in each speckle trace.
    pub samples_per_speckle: usize,
    /// Wall time of the batch in seconds.
    pub batch_seconds: f64,
}

impl MetricsSnapshot {
    /// Summarizes a finished batch.
    pub fn from_result(result: &PipelineResult) -> Self {
        Self {
            frames_extracted: result.count(FrameStatus::Extracted) as u64,
            frames_skipped: result.count(FrameStatus::Skipped) as u64,
            frames_failed: result.count(FrameStatus::Failed) as u64,
            speckles: result.speckle_count,
            samples_per_speckle: result.traces.first().map_or(0, Vec::len),
            batch_seconds: result.elapsed.as_secs_f64(),
        }
    }
}

/// Prometheus metrics registry for the extraction pipeline.
pub struct MetricsRegistry {
    registry: Registry,

    // Frame counters
    frames_extracted: IntCounter,
    frames_skipped: IntCounter,
    frames_failed: IntCounter,

    // Latest batch
    speckles: IntGauge,
    samples_per_speckle: IntGauge,
    batch_seconds: Gauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all pipeline metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_extracted = IntCounter::new(
            "speckle_vib_frames_extracted_total",
            "Frames that produced speckle traces",
        )?;
        let frames_skipped = IntCounter::new(
            "speckle_vib_frames_skipped_total",
            "Frames skipped for missing speckles or row bands",
        )?;
        let frames_failed = IntCounter::new(
            "speckle_vib_frames_failed_total",
            "Frames whose extraction failed",
        )?;

        let speckles = IntGauge::new(
            "speckle_vib_speckles",
            "Speckle slots in the latest batch",
        )?;
        let samples_per_speckle = IntGauge::new(
            "speckle_vib_samples_per_speckle",
            "Samples in each speckle trace of the latest batch",
        )?;
        let batch_seconds = Gauge::new(
            "speckle_vib_batch_seconds",
            "Wall time of the latest batch in seconds",
        )?;

        registry.register(Box::new(frames_extracted.clone()))?;
        registry.register(Box::new(frames_skipped.clone()))?;
        registry.register(Box::new(frames_failed.clone()))?;
        registry.register(Box::new(speckles.clone()))?;
        registry.register(Box::new(samples_per_speckle.clone()))?;
        registry.register(Box::new(batch_seconds.clone()))?;

        Ok(Self {
            registry,
            frames_extracted,
            frames_skipped,
            frames_failed,
            speckles,
            samples_per_speckle,
            batch_seconds,
        })
    }

    /// Records one batch. Frame counters accumulate across batches.
    pub fn record(&self, snapshot: &MetricsSnapshot) {
        self.frames_extracted.inc_by(snapshot.frames_extracted);
        self.frames_skipped.inc_by(snapshot.frames_skipped);
        self.frames_failed.inc_by(snapshot.frames_failed);

        self.speckles.set(snapshot.speckles as i64);
        self.samples_per_speckle.set(snapshot.samples_per_speckle as i64);
        self.batch_seconds.set(snapshot.batch_seconds);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
