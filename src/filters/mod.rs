//! Smoothing and denoising filters.
//!
//! Gaussian smoothing for intensity profiles, a frequency-domain lowpass
//! for displacement traces, and a square median filter for image crops.

mod gaussian;
mod lowpass;
mod median;

pub use gaussian::{gaussian_filter1d, gaussian_kernel};
pub use lowpass::Lowpass;
pub use median::median_filter;
