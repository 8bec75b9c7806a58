//! Autoregressive reconstruction of missing trace samples.
//!
//! Samples that are exactly zero inside the active segment are treated as
//! missing. An AR model is fit on the known samples and the missing ones are
//! predicted left to right, each prediction seeing the ones before it. The
//! model is refit on the densified trace for every further iteration.

mod design;
mod interpolate;
mod model;

pub use design::lagged_design;
pub use interpolate::{ArInterpolator, GapFillError};
pub use model::{fit_ar, ridge_solve, ArModel};
