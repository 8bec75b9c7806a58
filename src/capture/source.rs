//! Frame source abstraction.
//!
//! Sources hand an ordered sequence of frames to the pipeline. The trait
//! lets the binary read image files while tests and benches use a
//! deterministic synthetic generator.

use super::Frame;
use image::{DynamicImage, GrayImage, Luma};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions decoded by [`ImageSequence::from_dir`].
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Errors that can occur while producing frames.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No image files were found at the given location.
    #[error("no frames found in {0}")]
    NoFrames(String),
    /// An image file could not be opened or decoded.
    #[error("failed to read {path}: {reason}")]
    ReadFailed {
        /// File that failed.
        path: String,
        /// Decoder or I/O message.
        reason: String,
    },
    /// A raw pixel buffer does not match the stated dimensions.
    #[error("buffer of {len} bytes does not match {width}x{height}")]
    BadBuffer {
        /// Buffer length in bytes.
        len: usize,
        /// Stated width in pixels.
        width: usize,
        /// Stated height in pixels.
        height: usize,
    },
    /// The synthetic generator parameters are invalid.
    #[error("invalid synthetic source configuration: {0}")]
    ConfigFailed(String),
    /// A frame was requested before `open`.
    #[error("frame source not initialized")]
    NotInitialized,
}

/// Trait for frame producers.
pub trait FrameSource {
    /// Prepares the source for reading from the first frame.
    fn open(&mut self) -> Result<(), SourceError>;

    /// Produces the next frame, or `None` once the sequence is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);

    /// Number of frames the source will produce, when known up front.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// Opens `source`, drains every frame, then closes it.
pub fn collect_frames(source: &mut dyn FrameSource) -> Result<Vec<Frame>, SourceError> {
    source.open()?;
    let mut frames = Vec::with_capacity(source.len_hint().unwrap_or(0));
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
    }
    source.close();
    Ok(frames)
}

/// Reads image files in order and converts each to 8-bit grayscale.
///
/// Colour images are reduced with the ITU-R 601 luma weights
/// `(299 R + 587 G + 114 B) / 1000`, the same conversion common imaging
/// libraries apply when asked for an `L` image.
#[derive(Debug, Default)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    cursor: Option<usize>,
}

impl ImageSequence {
    /// Creates a sequence over explicit file paths, kept in the given order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            cursor: None,
        }
    }

    /// Creates a sequence over every image file in `dir`, sorted by name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(SourceError::NoFrames(dir.display().to_string()));
        }
        Ok(Self::from_paths(paths))
    }

    /// Returns the paths this sequence reads.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSequence {
    fn open(&mut self) -> Result<(), SourceError> {
        if self.paths.is_empty() {
            return Err(SourceError::NoFrames("empty path list".to_string()));
        }
        self.cursor = Some(0);
        tracing::info!(frames = self.paths.len(), "Image sequence opened");
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let cursor = self.cursor.ok_or(SourceError::NotInitialized)?;
        let Some(path) = self.paths.get(cursor) else {
            return Ok(None);
        };

        let luma = image::open(path)
            .map(luma_601)
            .map_err(|e| SourceError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let (width, height) = luma.dimensions();
        let frame = Frame::from_raw(
            luma.into_raw(),
            width as usize,
            height as usize,
            cursor as u64,
        )?;

        tracing::trace!(path = %path.display(), width, height, "Frame decoded");
        self.cursor = Some(cursor + 1);
        Ok(Some(frame))
    }

    fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    fn close(&mut self) {
        self.cursor = None;
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}

/// Converts to 8-bit grayscale with ITU-R 601 weights, rounding to nearest.
fn luma_601(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
                Luma([((weighted + 500) / 1000) as u8])
            })
        }
    }
}
