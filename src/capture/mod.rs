//! Frame input.
//!
//! This module provides the frame type consumed by the extraction pipeline
//! and a small source abstraction for loading frame sequences from disk or
//! generating synthetic ones. Sources only hand frames over; they never take
//! part in the signal processing.

mod frame;
mod source;
mod synthetic;

pub use frame::Frame;
pub use source::{collect_frames, FrameSource, ImageSequence, SourceError};
pub use synthetic::{SyntheticConfig, SyntheticSpeckle};
