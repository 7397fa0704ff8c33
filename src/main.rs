//! Entry point for the GridBin application.
//! Parses the CLI, opens the dataset and dispatches to binning, map comparison or
//! metadata printing.

use clap::Parser;
use grid_bin::binning::{bin_variables, Aggregation, RasterBinner};
use grid_bin::comparison::MapComparison;
use grid_bin::dataset::{open_dataset, Dataset, DatasetSource};
use grid_bin::metadata::{describe_variable, list_variables_and_dimensions, print_dataset};
use grid_bin::netcdf_io::{write_comparison, RasterWriter};
use grid_bin::options::PlotOptions;
use grid_bin::parallel::{ParallelConfig, ParallelInfo};
use netcdf::File;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::{Args, BinSpec};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        ParallelInfo::current().log_info();
    }

    let source = DatasetSource::parse(&args.file)?;
    let file = open_dataset(&source)?;
    println!("Successfully opened NetCDF dataset: {}", source);

    if args.list_vars {
        list_variables_and_dimensions(&file)?;
    } else if let Some(var) = &args.describe {
        describe_variable(&file, var)?;
    } else if let Some(spec) = &args.bin {
        run_binning(&file, spec, &args)?;
    } else if let Some(var) = &args.compare {
        run_comparison(&file, var, &args)?;
    } else {
        print_dataset(&file)?;
    }

    Ok(())
}

fn run_binning(file: &File, spec: &BinSpec, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let binner = RasterBinner::new(args.nx, args.ny)
        .with_extent(&args.extent)
        .with_aggregation(Aggregation::from_calc_average(!args.normalize));

    let result = bin_variables(file, &spec.x, &spec.y, spec.z.as_deref(), &binner)?;

    if let Some(output_path) = &args.output_netcdf {
        let var_name = match &spec.z {
            Some(z) => format!("{}_binned", z),
            None => "samples_binned".to_string(),
        };
        RasterWriter::new(output_path).write(&result, &var_name)?;
        println!("✅ Saved raster to {}", output_path.display());
    } else {
        let filled = result.count.iter().filter(|&&n| n > 0).count();
        println!("\n Raster {}x{} ({})", result.nx(), result.ny(), result.aggregation.as_str());
        println!("==============================");
        println!(" Extent: {:?}", result.extent.to_array());
        println!(" Samples: {}", result.total_count());
        println!(" Filled pixels: {} / {}", filled, result.count.len());
    }

    Ok(())
}

fn run_comparison(file: &File, var: &str, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = match &args.options {
        Some(path) => PlotOptions::from_json_file(path)?,
        None => PlotOptions::new(),
    };

    let target_dataset = match &args.target {
        Some(location) => Some(open_dataset(&DatasetSource::parse(location)?)?),
        None => None,
    };
    let target = target_dataset.as_ref().map_or(file, Dataset::file);
    let target_var = args.target_var.as_deref().unwrap_or(var);

    let comparison = MapComparison::build(file, var, target, target_var, &options)?;
    comparison.print_summary();

    if let Some(output_path) = &args.output_netcdf {
        write_comparison(&comparison, output_path)?;
        println!("✅ Saved comparison to {}", output_path.display());
    }

    Ok(())
}
