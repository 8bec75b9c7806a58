//! Prometheus metrics for extraction batches.
//!
//! # Metrics Exposed
//!
//! ## Frame Counters
//! - `speckle_vib_frames_extracted_total` - Frames that produced traces
//! - `speckle_vib_frames_skipped_total` - Frames without speckles or row bands
//! - `speckle_vib_frames_failed_total` - Frames whose extraction failed
//!
//! ## Latest Batch
//! - `speckle_vib_speckles` - Speckle slots with a trace
//! - `speckle_vib_samples_per_speckle` - Samples in each trace
//! - `speckle_vib_batch_seconds` - Batch wall time
//!
//! # Example
//!
//! ```no_run
//! use speckle_vib::metrics::{MetricsRegistry, MetricsSnapshot};
//! use speckle_vib::pipeline::VibrationExtractor;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let result = VibrationExtractor::default().run(&[]);
//!
//! registry.record(&MetricsSnapshot::from_result(&result));
//! println!("{}", registry.encode().expect("Failed to encode metrics"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
