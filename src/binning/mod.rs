//! Scatter-to-raster binning
//!
//! Converts paired coordinate sequences and an associated value into a dense
//! `(ny, nx)` raster. Each sample is mapped to one pixel, values landing on the
//! same pixel are summed, and the sums are then either averaged by the sample
//! count or normalised by the largest absolute value.
//!
//! # Organization
//!
//! - [`extent`]: bounding box handling
//! - [`operations`]: value source, aggregation mode and result types
//! - [`parallel`]: the per-sample and per-pixel passes
//! - [`variables`]: binning variables read from a NetCDF file
//!
//! # Example
//!
//! ```rust
//! use grid_bin::binning::{bin_to_raster, ZData};
//!
//! let x = [0.0, 1.0, 2.0];
//! let y = [0.0, 1.0, 2.0];
//! let raster = bin_to_raster(&x, &y, ZData::default(), 3, 3, &[], true).unwrap();
//! assert_eq!(raster.buffer[[1, 1]], 1.0);
//! assert_eq!(raster.extent.to_array(), [0.0, 2.0, 0.0, 2.0]);
//! ```

pub mod extent;
pub mod operations;
pub mod parallel;
pub mod variables;

pub use extent::{Extent, ExtentSpec};
pub use operations::{Aggregation, RasterResult, ZData};
pub use variables::bin_variables;

use crate::errors::{GridBinError, Result};
use tracing::debug;

/// Default raster width
pub const DEFAULT_NX: usize = 640;
/// Default raster height
pub const DEFAULT_NY: usize = 480;

/// Reusable binning configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBinner {
    pub nx: usize,
    pub ny: usize,
    /// Either empty, or `[x_min, x_max, y_min, y_max]`; any other length is
    /// reported and ignored
    pub extent: Vec<f64>,
    pub aggregation: Aggregation,
}

impl Default for RasterBinner {
    fn default() -> Self {
        Self {
            nx: DEFAULT_NX,
            ny: DEFAULT_NY,
            extent: Vec::new(),
            aggregation: Aggregation::Average,
        }
    }
}

impl RasterBinner {
    /// Create a binner for an `nx` by `ny` raster with derived bounds
    #[must_use]
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extent(mut self, extent: &[f64]) -> Self {
        self.extent = extent.to_vec();
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Bin the samples `(x[i], y[i])` carrying `z` into a fresh raster.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the raster has a zero side
    /// - `x`, `y` and per-sample `z` differ in length
    /// - bounds must be derived but there are no samples
    /// - a sample maps outside the raster even after negative indexing
    pub fn bin(&self, x: &[f64], y: &[f64], z: ZData<'_>) -> Result<RasterResult> {
        let (nx, ny) = (self.nx, self.ny);
        if nx == 0 || ny == 0 {
            return Err(GridBinError::InvalidRasterSize { nx, ny });
        }
        if x.len() != y.len() {
            return Err(GridBinError::LengthMismatch {
                what: "y coordinates",
                expected: x.len(),
                found: y.len(),
            });
        }
        z.check_len(x.len())?;

        let x = parallel::replace_nan(x);
        let y = parallel::replace_nan(y);

        let spec = ExtentSpec::from_slice(&self.extent);
        let extent = spec.resolve(&x, &y)?;
        let clamp = spec.clamps_far_edge();

        let x_loc = parallel::pixel_locations(&x, extent.x_min, extent.x_max, nx, clamp, 'x')?;
        let y_loc = parallel::pixel_locations(&y, extent.y_min, extent.y_max, ny, clamp, 'y')?;

        debug!(
            samples = x.len(),
            nx,
            ny,
            extent = ?extent.to_array(),
            aggregation = self.aggregation.as_str(),
            "binning samples into raster"
        );

        let (mut buffer, count) = parallel::accumulate(&x_loc, &y_loc, z, nx, ny);

        match self.aggregation {
            Aggregation::Average => parallel::average_in_place(&mut buffer, &count),
            Aggregation::Normalize => parallel::normalize_in_place(&mut buffer),
        }

        Ok(RasterResult {
            buffer,
            extent,
            count,
            aggregation: self.aggregation,
        })
    }
}

/// Bin scattered samples into an `(ny, nx)` raster in one call.
///
/// `extent` is either empty (bounds derived from the data) or
/// `[x_min, x_max, y_min, y_max]`. `calc_average` selects per-pixel averaging;
/// otherwise the buffer is normalised to roughly `[-1, 1]`.
///
/// # Errors
///
/// See [`RasterBinner::bin`].
pub fn bin_to_raster(
    x: &[f64],
    y: &[f64],
    z: ZData<'_>,
    nx: usize,
    ny: usize,
    extent: &[f64],
    calc_average: bool,
) -> Result<RasterResult> {
    RasterBinner::new(nx, ny)
        .with_extent(extent)
        .with_aggregation(Aggregation::from_calc_average(calc_average))
        .bin(x, y, z)
}
