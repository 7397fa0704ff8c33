//! Binning variables stored in a NetCDF file
//!
//! Coordinates and values are read flattened. When `x` and `y` are 1-D axes
//! and the value variable is laid out on them (trailing dimensions `[y, x]`),
//! the axes are expanded to one coordinate pair per value first. Leading
//! dimensions such as `time` repeat the expanded grid once per slice, so every
//! step lands on the same raster.

use super::operations::{RasterResult, ZData};
use super::RasterBinner;
use crate::errors::{GridBinError, Result};
use netcdf::{File, Variable};
use tracing::info;

/// Bins `z_var` (or a constant 1 per sample) at `(x_var, y_var)`.
///
/// # Errors
///
/// Returns an error if a variable is missing, the data cannot be read, or the
/// binning itself fails.
pub fn bin_variables(
    file: &File,
    x_var: &str,
    y_var: &str,
    z_var: Option<&str>,
    binner: &RasterBinner,
) -> Result<RasterResult> {
    let x_variable = find_variable(file, x_var)?;
    let y_variable = find_variable(file, y_var)?;

    let mut x: Vec<f64> = x_variable.get_values::<f64, _>(..)?;
    let mut y: Vec<f64> = y_variable.get_values::<f64, _>(..)?;

    let z: Option<Vec<f32>> = match z_var {
        Some(name) => {
            let z_variable = find_variable(file, name)?;
            let values = z_variable.get_values::<f32, _>(..)?;
            if let Some(slices) = slices_on_axes(&z_variable, &x_variable, &y_variable) {
                info!(
                    "🧭 Expanding axes '{}' x '{}' to match '{}' ({} slices)",
                    y_var, x_var, name, slices
                );
                let (gx, gy) = expand_axes(&x, &y, slices);
                x = gx;
                y = gy;
            }
            Some(values)
        }
        None => None,
    };

    let z_data = z.as_deref().map_or_else(ZData::default, ZData::PerSample);

    info!(
        "⚡ Binning {} samples into a {}x{} raster",
        x.len(),
        binner.nx,
        binner.ny
    );

    binner.bin(&x, &y, z_data)
}

fn find_variable<'f>(file: &'f File, name: &str) -> Result<Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| GridBinError::VariableNotFound {
            var: name.to_string(),
        })
}

/// Number of `[y, x]` slices in `z` when its trailing dimensions are the two
/// 1-D axes, `None` when `z` is not laid out on them
fn slices_on_axes(z: &Variable, x: &Variable, y: &Variable) -> Option<usize> {
    let (x_dims, y_dims, z_dims) = (x.dimensions(), y.dimensions(), z.dimensions());
    if x_dims.len() != 1 || y_dims.len() != 1 || z_dims.len() < 2 {
        return None;
    }

    let n = z_dims.len();
    let on_axes = z_dims[n - 2].name() == y_dims[0].name()
        && z_dims[n - 1].name() == x_dims[0].name();
    on_axes.then(|| z_dims[..n - 2].iter().map(netcdf::Dimension::len).product())
}

/// Row-major meshgrid repeated `slices` times: `y` varies slowest, `x` fastest
fn expand_axes(x: &[f64], y: &[f64], slices: usize) -> (Vec<f64>, Vec<f64>) {
    let size = x.len() * y.len() * slices;
    let mut gx = Vec::with_capacity(size);
    let mut gy = Vec::with_capacity(size);
    for _ in 0..slices {
        for &row in y {
            for &col in x {
                gx.push(col);
                gy.push(row);
            }
        }
    }
    (gx, gy)
}
