//! NetCDF output for binned rasters and map comparisons
//!
//! Results are written to fresh NetCDF files with coordinate variables,
//! descriptive attributes and a `history` entry.

use crate::binning::RasterResult;
use crate::comparison::MapComparison;
use crate::errors::Result;
use chrono::Utc;
use ndarray::Array1;
use netcdf::{create, FileMut};
use std::{fs, path::Path};
use tracing::info;

fn history_entry() -> String {
    format!("Created by GridBin on {}", Utc::now().to_rfc3339())
}

/// Replace any existing file at `path` with a new, empty NetCDF file
fn fresh_file(path: &Path) -> Result<FileMut> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(create(path)?)
}

/// Writer for binned rasters
pub struct RasterWriter<'a> {
    output_path: &'a Path,
}

impl<'a> RasterWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write `result` as `var_name(y, x)` plus `{var_name}_count(y, x)`.
    pub fn write(&self, result: &RasterResult, var_name: &str) -> Result<()> {
        let mut file = fresh_file(self.output_path)?;

        file.add_dimension("y", result.ny())?;
        file.add_dimension("x", result.nx())?;

        let mut x_var = file.add_variable::<f64>("x", &["x"])?;
        x_var.put_attribute("long_name", "pixel x coordinate")?;
        x_var.put(Array1::from(result.x_coordinates()).view(), ..)?;

        let mut y_var = file.add_variable::<f64>("y", &["y"])?;
        y_var.put_attribute("long_name", "pixel y coordinate")?;
        y_var.put(Array1::from(result.y_coordinates()).view(), ..)?;

        let mut data_var = file.add_variable::<f32>(var_name, &["y", "x"])?;
        data_var.put_attribute("aggregation", result.aggregation.as_str())?;
        data_var.put_attribute("extent", result.extent.to_array().to_vec())?;
        data_var.put(result.buffer.view(), ..)?;

        #[allow(clippy::cast_possible_wrap)]
        let counts = result.count.mapv(|n| n as i64);
        let count_name = format!("{var_name}_count");
        let mut count_var = file.add_variable::<i64>(&count_name, &["y", "x"])?;
        count_var.put_attribute("long_name", "samples per pixel")?;
        count_var.put(counts.view(), ..)?;

        file.add_attribute("history", history_entry())?;

        info!(
            "💾 Wrote {}x{} raster '{}' to {}",
            result.nx(),
            result.ny(),
            var_name,
            self.output_path.display()
        );
        Ok(())
    }
}

/// Write both panels of `comparison` with their shared grid edges.
///
/// Variables: `lat_edges`, `lon_edges`, `left_celsius`, `right_celsius`,
/// `left_class`, `right_class`. Titles, levels and colorbar ticks are stored
/// as attributes.
pub fn write_comparison(comparison: &MapComparison, output_path: &Path) -> Result<()> {
    let mut file = fresh_file(output_path)?;
    let (n_lat, n_lon) = comparison.left.celsius.dim();

    file.add_dimension("lat", n_lat)?;
    file.add_dimension("lon", n_lon)?;
    file.add_dimension("lat_edge", comparison.lat_edges.len())?;
    file.add_dimension("lon_edge", comparison.lon_edges.len())?;

    let mut lat_edges = file.add_variable::<f64>("lat_edges", &["lat_edge"])?;
    lat_edges.put(Array1::from(comparison.lat_edges.clone()).view(), ..)?;
    let mut lon_edges = file.add_variable::<f64>("lon_edges", &["lon_edge"])?;
    lon_edges.put(Array1::from(comparison.lon_edges.clone()).view(), ..)?;

    for (prefix, panel) in [("left", &comparison.left), ("right", &comparison.right)] {
        let mut celsius = file.add_variable::<f32>(&format!("{prefix}_celsius"), &["lat", "lon"])?;
        celsius.put_attribute("units", "degC")?;
        celsius.put_attribute("title", panel.title.as_str())?;
        celsius.put(panel.celsius.view(), ..)?;

        let mut classes = file.add_variable::<i32>(&format!("{prefix}_class"), &["lat", "lon"])?;
        classes.put_attribute("long_name", "color class (-1 under, ncolors over, -2 missing)")?;
        classes.put(panel.classes.view(), ..)?;
    }

    file.add_attribute("colormap", comparison.colormap.colormap.name.as_str())?;
    file.add_attribute("levels", comparison.colormap.bounds.clone())?;
    file.add_attribute("colorbar_ticks", comparison.colorbar_ticks.clone())?;
    file.add_attribute("valid_time", comparison.time_stamp.as_str())?;
    file.add_attribute("history", history_entry())?;

    info!("💾 Wrote map comparison to {}", output_path.display());
    Ok(())
}
