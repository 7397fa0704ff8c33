//! GridBin: scatter-to-raster binning and temperature map comparison
//!
//! A small toolkit for exploring gridded climate data stored in NetCDF files.
//! It turns scattered `(x, y, z)` samples into image-like raster buffers, and
//! prepares two temperature fields for a side-by-side map comparison with a
//! shared discrete colormap.
//!
//! ## Module Organization
//!
//! - [`binning`]: scatter-to-raster binning with averaging or normalisation
//! - [`options`]: plot option lookup with defaults
//! - [`colormap`]: discrete temperature colormaps and boundary normalisation
//! - [`comparison`]: cell edges, time stamps and panels for map comparisons
//! - [`dataset`]: opening datasets from a path or URL
//! - [`metadata`]: printing dataset structure
//! - [`netcdf_io`]: writing rasters and comparisons to NetCDF
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use grid_bin::prelude::*;
//!
//! let x = [0.0, 0.5, 1.0, 1.0];
//! let y = [0.0, 0.5, 1.0, 1.0];
//! let z = [2.0_f32, 3.0, 2.0, 4.0];
//!
//! let raster = RasterBinner::new(2, 2).bin(&x, &y, ZData::PerSample(&z)).unwrap();
//! assert_eq!(raster.count[[1, 1]], 2);
//! assert_eq!(raster.buffer[[1, 1]], 3.0);
//! ```

pub mod binning;
pub mod colormap;
pub mod comparison;
pub mod dataset;
pub mod errors;
pub mod metadata;
pub mod netcdf_io;
pub mod options;
pub mod parallel;

pub use errors::{GridBinError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::binning::{bin_to_raster, Aggregation, Extent, RasterBinner, RasterResult, ZData};
    pub use crate::colormap::{temperature_colormap, BoundaryNorm, ColorClass, TemperatureColormap};
    pub use crate::comparison::MapComparison;
    pub use crate::dataset::{open_dataset, Dataset, DatasetSource};
    pub use crate::errors::{GridBinError, Result};
    pub use crate::netcdf_io::RasterWriter;
    pub use crate::options::{provide_default, PlotOptions};
    pub use crate::parallel::ParallelConfig;
}
