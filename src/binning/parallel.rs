//! Parallel pieces of the binning pass
//!
//! Per-sample work (NaN cleaning, pixel location) and per-pixel work
//! (averaging, normalisation) run on the rayon pool. Accumulation into the
//! raster stays sequential so repeated runs give bit-identical buffers.

use super::operations::ZData;
use crate::errors::{GridBinError, Result};
use ndarray::{Array2, Zip};
use rayon::prelude::*;

/// Replace NaN coordinates with zero; samples are kept, not dropped.
#[must_use]
pub fn replace_nan(values: &[f64]) -> Vec<f64> {
    values
        .par_iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .collect()
}

/// Map coordinates onto pixel indices along one axis.
///
/// The scaled position is rounded half-to-even and truncated to an integer.
/// With `clamp_far_edge`, indices at or past `len` land on the last pixel.
/// Negative indices count back from the far edge, the way array indexing
/// treats them.
///
/// # Errors
///
/// Returns [`GridBinError::PixelOutOfRange`] if an index lies outside
/// `-len..len`.
pub fn pixel_locations(
    coords: &[f64],
    min: f64,
    max: f64,
    len: usize,
    clamp_far_edge: bool,
    axis: char,
) -> Result<Vec<usize>> {
    let width = max - min;
    let scale = (len - 1) as f64;
    let last = len as i64 - 1;

    coords
        .par_iter()
        .map(|&c| {
            // float -> int saturates, NaN becomes 0
            #[allow(clippy::cast_possible_truncation)]
            let mut index = (scale * (c - min) / width).round_ties_even() as i64;
            if clamp_far_edge && index > last {
                index = last;
            }
            wrap_index(index, len, axis)
        })
        .collect()
}

fn wrap_index(index: i64, len: usize, axis: char) -> Result<usize> {
    let n = len as i64;
    if (0..n).contains(&index) {
        Ok(index as usize)
    } else if (-n..0).contains(&index) {
        Ok((n + index) as usize)
    } else {
        Err(GridBinError::PixelOutOfRange { axis, index, len })
    }
}

/// Sum values and sample counts per pixel.
#[must_use]
pub fn accumulate(
    x_loc: &[usize],
    y_loc: &[usize],
    z: ZData<'_>,
    nx: usize,
    ny: usize,
) -> (Array2<f32>, Array2<usize>) {
    let mut buffer = Array2::<f32>::zeros((ny, nx));
    let mut count = Array2::<usize>::zeros((ny, nx));

    for (i, (&col, &row)) in x_loc.iter().zip(y_loc).enumerate() {
        buffer[[row, col]] += z.value(i);
        count[[row, col]] += 1;
    }

    (buffer, count)
}

/// Divide each pixel by its count, treating empty pixels as a count of one.
pub fn average_in_place(buffer: &mut Array2<f32>, count: &Array2<usize>) {
    Zip::from(buffer).and(count).par_for_each(|value, &n| {
        #[allow(clippy::cast_precision_loss)]
        let divisor = n.max(1) as f32;
        *value /= divisor;
    });
}

/// Divide the buffer by its largest absolute value.
///
/// An all-zero buffer divides by zero and turns into NaN; a NaN anywhere in
/// the buffer propagates to every pixel.
pub fn normalize_in_place(buffer: &mut Array2<f32>) {
    let peak = buffer.iter().fold(0.0_f32, |peak, v| {
        let magnitude = v.abs();
        if magnitude.is_nan() || magnitude > peak {
            magnitude
        } else {
            peak
        }
    });

    buffer.par_mapv_inplace(|v| v / peak);
}
