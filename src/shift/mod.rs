//! Sub-pixel row-to-row shift estimation.
//!
//! Each row of a crop is one time sample of the speckle pattern along the
//! columns. Consecutive rows are compared by full cross-correlation and the
//! correlation peak is refined to sub-pixel precision with a parabola.

mod subpixel;

pub use subpixel::{cross_correlate, normalize_row, parabolic_offset, row_shifts};
