//! Speckle Vibration Extraction Library
//!
//! Recovers sub-pixel vibration signals from image sequences of laser
//! speckle recorded with a rolling-shutter sensor. Each sensor row is
//! exposed slightly later than the one above it, so the column shift
//! between consecutive rows of a speckle samples the vibration at the row
//! period.
//!
//! # Architecture
//!
//! ```text
//! capture → detection → shift → filters → gapfill → pipeline
//!                                                      ↓
//!                                          spectrum, metrics
//! ```
//!
//! # Example
//!
//! ```no_run
//! use speckle_vib::{
//!     capture::{collect_frames, SyntheticConfig, SyntheticSpeckle},
//!     config::PipelineConfig,
//!     pipeline::VibrationExtractor,
//!     spectrum::dominant_frequency,
//! };
//!
//! let mut source = SyntheticSpeckle::new(SyntheticConfig::default());
//! let frames = collect_frames(&mut source).unwrap();
//!
//! let config = PipelineConfig::default();
//! let sample_period = config.sample_period_s;
//! let result = VibrationExtractor::new(config).unwrap().run(&frames);
//!
//! for trace in &result.traces {
//!     if let Some(peak) = dominant_frequency(trace, sample_period) {
//!         println!("{:.1} Hz", peak.frequency_hz);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod detection;
pub mod filters;
pub mod gapfill;
pub mod metrics;
pub mod pipeline;
pub mod shift;
pub mod spectrum;

// Re-export commonly used types at crate root
pub use capture::{Frame, FrameSource, ImageSequence, SyntheticSpeckle};
pub use config::{FileConfig, PipelineConfig};
pub use detection::{Interval, IntervalDetector, IntervalMode, PeakDetector};
pub use gapfill::ArInterpolator;
pub use pipeline::{extract_vibrations, PipelineResult, VibrationExtractor};
pub use spectrum::{dominant_frequency, SpectralPeak};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;
