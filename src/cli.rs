//! Defines command-line interface options using `clap` for the GridBin application.

use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for binning and comparing gridded climate data
#[derive(Parser, Debug)]
#[command(
    version = "0.1.0",
    name = "GridBin",
    about = "Bin scattered NetCDF samples into rasters and compare temperature maps"
)]
pub struct Args {
    /// Path or OPeNDAP URL of the NetCDF dataset
    #[arg(short, long)]
    pub file: String,

    /// List all variables and dimensions in the dataset
    #[arg(long)]
    pub list_vars: bool,

    /// Describe a specific variable (data type, shape, and attributes)
    #[arg(long)]
    pub describe: Option<String>,

    /// Bin variables into a raster, formatted as <x>:<y> or <x>:<y>:<z>
    #[arg(long, value_parser = parse_bin_arg)]
    pub bin: Option<BinSpec>,

    /// Raster width in pixels
    #[arg(long, default_value_t = 640)]
    pub nx: usize,

    /// Raster height in pixels
    #[arg(long, default_value_t = 480)]
    pub ny: usize,

    /// Raster extent as x_min,x_max,y_min,y_max. Derived from the data if omitted.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub extent: Vec<f64>,

    /// Normalise the raster to +/- 1 instead of averaging each pixel
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Compare a temperature variable (Kelvin) against --target
    #[arg(long)]
    pub compare: Option<String>,

    /// Dataset holding the comparison target. Defaults to --file.
    #[arg(long)]
    pub target: Option<String>,

    /// Variable in the target dataset. Defaults to the --compare variable.
    #[arg(long)]
    pub target_var: Option<String>,

    /// JSON file with plot options (title1, title2, levels)
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Path to save result as NetCDF. If not set, prints a summary.
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

/// Variables to bin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinSpec {
    pub x: String,
    pub y: String,
    pub z: Option<String>,
}

fn parse_bin_arg(s: &str) -> Result<BinSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [x, y] if !x.is_empty() && !y.is_empty() => Ok(BinSpec {
            x: x.to_string(),
            y: y.to_string(),
            z: None,
        }),
        [x, y, z] if !x.is_empty() && !y.is_empty() && !z.is_empty() => Ok(BinSpec {
            x: x.to_string(),
            y: y.to_string(),
            z: Some(z.to_string()),
        }),
        _ => Err("Invalid format: Expected '<x>:<y>' or '<x>:<y>:<z>'.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bin_spec_with_and_without_values() {
        assert_eq!(
            parse_bin_arg("lon:lat").unwrap(),
            BinSpec {
                x: "lon".to_string(),
                y: "lat".to_string(),
                z: None
            }
        );
        assert_eq!(parse_bin_arg("lon:lat:t2m").unwrap().z.as_deref(), Some("t2m"));
        assert!(parse_bin_arg("lon").is_err());
        assert!(parse_bin_arg("lon::t2m").is_err());
    }

    #[test]
    fn extent_accepts_negative_bounds() {
        let args = Args::try_parse_from([
            "gridbin", "--file", "in.nc", "--extent", "-10.5,20,-5,5",
        ])
        .unwrap();
        assert_eq!(args.extent, vec![-10.5, 20.0, -5.0, 5.0]);
        assert!(!args.normalize);
        assert_eq!((args.nx, args.ny), (640, 480));
    }
}
