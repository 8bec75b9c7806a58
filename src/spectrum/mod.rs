//! Frequency-domain summaries of extracted traces.

mod peak;

pub use peak::{dominant_frequency, SpectralPeak, SpectrumAnalyzer};
