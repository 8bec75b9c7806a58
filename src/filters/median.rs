//! Square median filter for 8-bit image crops.

use ndarray::{Array2, ArrayView2};

/// Applies a `window x window` median filter with edge replication.
///
/// Pixels outside the crop take the value of the nearest edge pixel, so the
/// output has the input shape. `window` must be odd; a window of one returns
/// a copy.
pub fn median_filter(image: ArrayView2<'_, u8>, window: usize) -> Array2<u8> {
    let (rows, cols) = image.dim();
    if window <= 1 || rows == 0 || cols == 0 {
        return image.to_owned();
    }

    let half = (window / 2) as isize;
    let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;
    let mut scratch = Vec::with_capacity(window * window);

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        scratch.clear();
        for dr in -half..=half {
            let rr = clamp(r as isize + dr, rows);
            for dc in -half..=half {
                scratch.push(image[[rr, clamp(c as isize + dc, cols)]]);
            }
        }
        let mid = scratch.len() / 2;
        *scratch.select_nth_unstable(mid).1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_removes_impulse() {
        let mut image = Array2::<u8>::from_elem((9, 9), 50);
        image[[4, 4]] = 255;

        let out = median_filter(image.view(), 3);
        assert_eq!(out[[4, 4]], 50);
        assert!(out.iter().all(|&v| v == 50));
    }

    #[test]
    fn test_constant_image_unchanged() {
        let image = Array2::<u8>::from_elem((5, 12), 77);
        assert_eq!(median_filter(image.view(), 7), image);
    }

    #[test]
    fn test_edges_replicated() {
        let image = array![[0u8, 0, 100, 100], [0, 0, 100, 100], [0, 0, 100, 100]];
        let out = median_filter(image.view(), 3);

        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[2, 3]], 100);
        assert_eq!(out.dim(), (3, 4));
    }

    #[test]
    fn test_window_one_is_identity() {
        let image = array![[1u8, 2], [3, 4]];
        assert_eq!(median_filter(image.view(), 1), image);
    }
}
