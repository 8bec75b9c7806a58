//! Measurement region detection.
//!
//! Speckle columns are found as half-height widths around peaks of the
//! smoothed column profile. Row bands are found as long runs of the row
//! profile above an adaptive threshold.

mod bands;
mod intervals;
mod peaks;
pub mod stats;

pub use bands::{select_row_bands, RowThreshold};
pub use intervals::{Interval, IntervalDetector, IntervalMode};
pub use peaks::PeakDetector;
