//! Core binning types
//!
//! This module defines the value source, the aggregation mode and the result
//! produced by a binning pass.

use super::extent::Extent;
use crate::errors::{GridBinError, Result};
use ndarray::Array2;

/// Value accumulated into each pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZData<'a> {
    /// One value broadcast to every sample
    Constant(f32),
    /// One value per sample, same length as the coordinates
    PerSample(&'a [f32]),
}

impl Default for ZData<'_> {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl<'a> From<&'a [f32]> for ZData<'a> {
    fn from(values: &'a [f32]) -> Self {
        Self::PerSample(values)
    }
}

impl From<f32> for ZData<'_> {
    fn from(value: f32) -> Self {
        Self::Constant(value)
    }
}

impl ZData<'_> {
    /// Value contributed by sample `i`
    #[must_use]
    pub fn value(&self, i: usize) -> f32 {
        match self {
            Self::Constant(v) => *v,
            Self::PerSample(values) => values[i],
        }
    }

    /// Check a per-sample source pairs up with `samples` coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::LengthMismatch`] when the lengths differ.
    pub fn check_len(&self, samples: usize) -> Result<()> {
        match self {
            Self::PerSample(values) if values.len() != samples => {
                Err(GridBinError::LengthMismatch {
                    what: "z values",
                    expected: samples,
                    found: values.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// What happens to the summed pixels once every sample is accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Divide each pixel by its sample count; empty pixels stay zero
    #[default]
    Average,
    /// Divide the whole buffer by its largest absolute value
    Normalize,
}

impl Aggregation {
    /// `true` selects averaging, `false` global normalisation
    #[must_use]
    pub const fn from_calc_average(calc_average: bool) -> Self {
        if calc_average {
            Self::Average
        } else {
            Self::Normalize
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Normalize => "normalize",
        }
    }
}

/// Output of a binning pass
#[derive(Debug, Clone)]
pub struct RasterResult {
    /// Aggregated value per pixel, shape `(ny, nx)`, indexed `[row=y, col=x]`
    pub buffer: Array2<f32>,
    /// Bounds the samples were mapped with
    pub extent: Extent,
    /// Samples per pixel, same shape as `buffer`
    pub count: Array2<usize>,
    /// Aggregation applied to `buffer`
    pub aggregation: Aggregation,
}

impl RasterResult {
    /// Raster width
    #[must_use]
    pub fn nx(&self) -> usize {
        self.buffer.ncols()
    }

    /// Raster height
    #[must_use]
    pub fn ny(&self) -> usize {
        self.buffer.nrows()
    }

    /// Number of samples that landed in the raster
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.count.sum()
    }

    /// Coordinate each column index stands for.
    #[must_use]
    pub fn x_coordinates(&self) -> Vec<f64> {
        pixel_coordinates(self.extent.x_min, self.extent.x_max, self.nx())
    }

    /// Coordinate each row index stands for.
    #[must_use]
    pub fn y_coordinates(&self) -> Vec<f64> {
        pixel_coordinates(self.extent.y_min, self.extent.y_max, self.ny())
    }
}

fn pixel_coordinates(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![min];
    }
    let step = (max - min) / (n - 1) as f64;
    (0..n).map(|i| min + step * i as f64).collect()
}
