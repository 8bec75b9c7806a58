//! Frame type representing one grayscale speckle image.

use super::SourceError;
use ndarray::{Array2, ArrayView2};

/// A single grayscale frame.
///
/// Pixels are stored row-major as `rows x cols`. Rows are successive time
/// samples of a rolling-shutter sensor, columns are the spatial axis along
/// which the speckle pattern moves.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// 8-bit intensities, `rows x cols`.
    pixels: Array2<u8>,
    /// Position of the frame in its sequence.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame from an intensity matrix.
    pub fn new(pixels: Array2<u8>, sequence: u64) -> Self {
        Self { pixels, sequence }
    }

    /// Creates a frame from a row-major byte buffer.
    pub fn from_raw(
        pixels: Vec<u8>,
        width: usize,
        height: usize,
        sequence: u64,
    ) -> Result<Self, SourceError> {
        let len = pixels.len();
        let pixels = Array2::from_shape_vec((height, width), pixels).map_err(|_| {
            SourceError::BadBuffer {
                len,
                width,
                height,
            }
        })?;
        Ok(Self::new(pixels, sequence))
    }

    /// Returns a borrowed view of the pixels.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.pixels.view()
    }

    /// Returns the number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    /// Returns the number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Returns `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns true if the frame holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .finish()
    }
}
