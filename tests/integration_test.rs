//! Integration tests against real NetCDF files created in a temp directory

use grid_bin::{
    binning::{bin_variables, Aggregation, RasterBinner},
    comparison::MapComparison,
    dataset::{open_dataset, DatasetSource},
    errors::{GridBinError, Result},
    metadata::{describe_variable, list_variables_and_dimensions, print_dataset},
    netcdf_io::{write_comparison, RasterWriter},
    options::PlotOptions,
};
use ndarray::{Array1, Array3};
use netcdf::{create, open, AttributeValue};
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::tempdir;

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let contents = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    (result, contents)
}

/// Answer a single HTTP request with `status_line` and `body`, returning the URL
fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Listener has no address");

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let header = format!(
            "{status_line}\r\nContent-Type: application/x-netcdf\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(header.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });

    format!("http://{addr}/data/test.nc")
}

/// Four scattered observations along an `obs` dimension
fn create_scatter_file(path: &Path) -> Result<()> {
    let mut file = create(path)?;
    file.add_dimension("obs", 4)?;

    let mut x = file.add_variable::<f64>("x", &["obs"])?;
    x.put(Array1::from(vec![0.0, 0.0, 1.0, 1.0]).view(), ..)?;
    let mut y = file.add_variable::<f64>("y", &["obs"])?;
    y.put(Array1::from(vec![0.0, 0.0, 1.0, 0.0]).view(), ..)?;
    let mut z = file.add_variable::<f32>("z", &["obs"])?;
    z.put_attribute("units", "K")?;
    z.put(Array1::from(vec![1.0_f32, 3.0, 5.0, 7.0]).view(), ..)?;

    file.add_attribute("title", "Scatter test")?;
    Ok(())
}

/// A one-step 2 m temperature field on a 3x2 lat/lon grid, in Kelvin
fn create_t2m_file(path: &Path, celsius: [f32; 6]) -> Result<()> {
    let mut file = create(path)?;
    file.add_dimension("time", 1)?;
    file.add_dimension("lat", 3)?;
    file.add_dimension("lon", 2)?;

    let mut time = file.add_variable::<f64>("time", &["time"])?;
    time.put_attribute("units", "hours since 2020-01-01 00:00:00")?;
    time.put(Array1::from(vec![12.0]).view(), ..)?;

    let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
    lat.put(Array1::from(vec![45.0, 46.0, 47.0]).view(), ..)?;
    let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
    lon.put(Array1::from(vec![5.0, 6.0]).view(), ..)?;

    let kelvin: Vec<f32> = celsius.iter().map(|c| c + 273.15).collect();
    let mut t2m = file.add_variable::<f32>("t2m", &["time", "lat", "lon"])?;
    t2m.put_attribute("units", "K")?;
    t2m.put(Array3::from_shape_vec((1, 3, 2), kelvin)?.view(), ..)?;
    Ok(())
}

#[test]
fn test_bin_scattered_variables() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("scatter.nc");
    create_scatter_file(&file_path)?;

    let file = open(&file_path)?;
    let result = bin_variables(&file, "x", "y", Some("z"), &RasterBinner::new(2, 2))?;

    assert_eq!(result.extent.to_array(), [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(result.count[[0, 0]], 2);
    assert_eq!(result.buffer[[0, 0]], 2.0);
    assert_eq!(result.buffer[[1, 1]], 5.0);
    assert_eq!(result.buffer[[0, 1]], 7.0);
    assert_eq!(result.buffer[[1, 0]], 0.0);
    assert_eq!(result.total_count(), 4);

    // without a value variable every sample counts as 1
    let normalized = bin_variables(
        &file,
        "x",
        "y",
        None,
        &RasterBinner::new(2, 2).with_aggregation(Aggregation::Normalize),
    )?;
    assert_eq!(normalized.buffer[[0, 0]], 1.0);
    assert_eq!(normalized.buffer[[1, 1]], 0.5);

    Ok(())
}

#[test]
fn test_bin_gridded_field_expands_axes() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("grid.nc");
    create_t2m_file(&file_path, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;

    let file = open(&file_path)?;
    let result = bin_variables(&file, "lon", "lat", Some("t2m"), &RasterBinner::new(2, 3))?;

    assert_eq!(result.extent.to_array(), [5.0, 6.0, 45.0, 47.0]);
    assert_eq!(result.total_count(), 6);
    assert!(result.count.iter().all(|&n| n == 1));
    assert!((result.buffer[[0, 0]] - 274.15).abs() < 1e-3);
    assert!((result.buffer[[2, 1]] - 279.15).abs() < 1e-3);

    Ok(())
}

#[test]
fn test_bin_multi_step_field_repeats_grid() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("steps.nc");

    let mut file = create(&file_path)?;
    file.add_dimension("time", 2)?;
    file.add_dimension("lat", 2)?;
    file.add_dimension("lon", 2)?;
    let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
    lat.put(Array1::from(vec![45.0, 46.0]).view(), ..)?;
    let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
    lon.put(Array1::from(vec![5.0, 6.0]).view(), ..)?;
    let values = vec![1.0_f32, 2.0, 3.0, 4.0, 3.0, 4.0, 5.0, 6.0];
    let mut field = file.add_variable::<f32>("t2m", &["time", "lat", "lon"])?;
    field.put(Array3::from_shape_vec((2, 2, 2), values)?.view(), ..)?;
    drop(file);

    let file = open(&file_path)?;
    let result = bin_variables(&file, "lon", "lat", Some("t2m"), &RasterBinner::new(2, 2))?;

    assert_eq!(result.total_count(), 8);
    assert!(result.count.iter().all(|&n| n == 2));
    assert_eq!(result.buffer[[0, 0]], 2.0);
    assert_eq!(result.buffer[[0, 1]], 3.0);
    assert_eq!(result.buffer[[1, 0]], 4.0);
    assert_eq!(result.buffer[[1, 1]], 5.0);
    Ok(())
}

#[test]
fn test_bin_missing_variable() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("scatter_missing.nc");
    create_scatter_file(&file_path)?;

    let file = open(&file_path)?;
    match bin_variables(&file, "x", "y", Some("nope"), &RasterBinner::default()) {
        Err(GridBinError::VariableNotFound { var }) => assert_eq!(var, "nope"),
        other => panic!("Expected VariableNotFound error, got {:?}", other.map(|r| r.extent)),
    }
    Ok(())
}

#[test]
fn test_raster_writer() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("scatter_in.nc");
    let output_path = temp_dir.path().join("raster_out.nc");
    create_scatter_file(&input_path)?;

    let input = open(&input_path)?;
    let result = bin_variables(&input, "x", "y", Some("z"), &RasterBinner::new(2, 2))?;
    RasterWriter::new(&output_path).write(&result, "z_binned")?;

    let output = open(&output_path)?;
    let var = output.variable("z_binned").expect("Variable should exist");
    assert_eq!(var.dimensions()[0].name(), "y");
    assert_eq!(var.dimensions()[1].name(), "x");

    let values: Vec<f32> = var.get_values::<f32, _>(..)?;
    assert_eq!(values, vec![2.0, 7.0, 0.0, 5.0]);

    match var.attribute("extent").expect("extent attribute").value()? {
        AttributeValue::Doubles(extent) => assert_eq!(extent, vec![0.0, 1.0, 0.0, 1.0]),
        other => panic!("Unexpected extent attribute {:?}", other),
    }

    let counts: Vec<i64> = output
        .variable("z_binned_count")
        .expect("Count variable should exist")
        .get_values::<i64, _>(..)?;
    assert_eq!(counts, vec![2, 1, 0, 1]);

    let x: Vec<f64> = output.variable("x").expect("x").get_values::<f64, _>(..)?;
    assert_eq!(x, vec![0.0, 1.0]);

    assert!(output.attribute("history").is_some());

    // writing again replaces the file
    RasterWriter::new(&output_path).write(&result, "z_binned")?;
    Ok(())
}

#[test]
fn test_map_comparison() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("input_t2m.nc");
    let target_path = temp_dir.path().join("target_t2m.nc");
    create_t2m_file(&input_path, [0.5, 10.5, -10.0, 30.0, 5.5, 23.5])?;
    create_t2m_file(&target_path, [1.5, 11.5, -4.5, 20.5, 6.5, 24.5])?;

    let input = open(&input_path)?;
    let target = open(&target_path)?;
    let options = PlotOptions::new().with("title1", "ERA5");

    let comparison = MapComparison::build(&input, "t2m", &target, "t2m", &options)?;

    assert_eq!(comparison.time_stamp, "2020-01-01 12:00 UTC");
    assert_eq!(comparison.left.title, "ERA5, 2020-01-01 12:00 UTC");
    assert_eq!(comparison.right.title, "target T2m, 2020-01-01 12:00 UTC");
    assert_eq!(comparison.lat_edges, vec![44.5, 45.5, 46.5, 47.5]);
    assert_eq!(comparison.lon_edges, vec![4.5, 5.5, 6.5]);
    assert_eq!(comparison.left.celsius.dim(), (3, 2));
    assert!((comparison.left.celsius[[0, 0]] - 0.5).abs() < 1e-3);

    // 30 default levels: under = -1, over = 30
    assert_eq!(comparison.left.classes[[0, 0]], 5);
    assert_eq!(comparison.left.classes[[0, 1]], 15);
    assert_eq!(comparison.left.classes[[1, 0]], -1);
    assert_eq!(comparison.left.classes[[1, 1]], 30);
    assert_eq!(comparison.left.classes[[2, 1]], 29);
    assert_eq!(comparison.right.classes[[2, 1]], 30);

    assert!(comparison.left.decoration.y_label.is_some());
    assert!(comparison.right.decoration.y_label.is_none());
    assert_eq!(comparison.colorbar_ticks.len(), 15);
    assert_eq!(comparison.figure_size, (12.0, 8.0));
    let (lo, hi) = comparison.left.range().expect("finite values");
    assert!((lo + 10.0).abs() < 1e-3);
    assert!((hi - 30.0).abs() < 1e-3);

    comparison.print_summary();
    Ok(())
}

#[test]
fn test_map_comparison_with_custom_levels_and_output() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("levels_t2m.nc");
    let output_path = temp_dir.path().join("comparison.nc");
    create_t2m_file(&input_path, [0.5, 1.5, 2.5, 3.5, 4.5, 5.5])?;

    let input = open(&input_path)?;
    let options = PlotOptions::from_json_str(r#"{"levels": [0, 2, 4, 6], "title2": "same"}"#)?;
    let comparison = MapComparison::build(&input, "t2m", &input, "t2m", &options)?;

    assert_eq!(comparison.colormap.bounds, vec![0.0, 2.0, 4.0, 6.0]);
    assert_eq!(comparison.colorbar_ticks, vec![2.0, 6.0]);
    assert_eq!(comparison.right.title, "same, 2020-01-01 12:00 UTC");
    assert_eq!(comparison.left.classes, comparison.right.classes);

    write_comparison(&comparison, &output_path)?;

    let output = open(&output_path)?;
    let classes: Vec<i32> = output
        .variable("left_class")
        .expect("left_class should exist")
        .get_values::<i32, _>(..)?;
    assert_eq!(classes, comparison.left.classes.iter().copied().collect::<Vec<_>>());

    let edges: Vec<f64> = output
        .variable("lat_edges")
        .expect("lat_edges should exist")
        .get_values::<f64, _>(..)?;
    assert_eq!(edges, vec![44.5, 45.5, 46.5, 47.5]);

    match output.attribute("levels").expect("levels attribute").value()? {
        AttributeValue::Doubles(levels) => assert_eq!(levels, vec![0.0, 2.0, 4.0, 6.0]),
        other => panic!("Unexpected levels attribute {:?}", other),
    }
    Ok(())
}

#[test]
fn test_map_comparison_missing_coordinates() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("no_coords.nc");
    create_scatter_file(&file_path)?;

    let file = open(&file_path)?;
    match MapComparison::build(&file, "z", &file, "z", &PlotOptions::new()) {
        Err(GridBinError::VariableNotFound { var }) => assert_eq!(var, "time"),
        other => panic!("Expected VariableNotFound error, got {:?}", other.map(|c| c.time_stamp)),
    }

    let options = PlotOptions::new().with("levels", "warm");
    let grid_path = temp_dir.path().join("wrong_levels.nc");
    create_t2m_file(&grid_path, [0.0; 6])?;
    let grid = open(&grid_path)?;
    assert!(matches!(
        MapComparison::build(&grid, "t2m", &grid, "t2m", &options),
        Err(GridBinError::OptionType { .. })
    ));
    Ok(())
}

#[test]
fn test_coordinate_failure_is_logged() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("no_time.nc");
    create_scatter_file(&file_path)?;
    let file = open(&file_path)?;

    let (result, log) =
        capture_logs(|| MapComparison::build(&file, "z", &file, "z", &PlotOptions::new()));

    assert!(matches!(result, Err(GridBinError::VariableNotFound { ref var }) if var == "time"));
    assert!(log.contains("Failed to retrieve coordinates from z"));
    assert!(log.contains("ERROR"));
    Ok(())
}

#[test]
fn test_open_remote_dataset() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("served.nc");
    create_t2m_file(&file_path, [0.0; 6])?;
    let url = serve_once("HTTP/1.1 200 OK", fs::read(&file_path)?);

    let source = DatasetSource::parse(&url)?;
    assert!(source.is_remote());

    let dataset = open_dataset(&source)?;
    assert!(dataset.is_downloaded());
    assert!(dataset.variable("t2m").is_some());
    assert_eq!(dataset.dimension("lat").map(|d| d.len()), Some(3));
    print_dataset(&dataset)?;
    list_variables_and_dimensions(dataset.file())?;
    Ok(())
}

#[test]
fn test_remote_dataset_http_error() -> Result<()> {
    let url = serve_once("HTTP/1.1 404 Not Found", Vec::new());

    match open_dataset(&DatasetSource::parse(&url)?) {
        Err(GridBinError::DownloadFailed { url: failed, status }) => {
            assert_eq!(status, 404);
            assert_eq!(failed, url);
        }
        Err(other) => panic!("Expected DownloadFailed, got {}", other),
        Ok(_) => panic!("Expected DownloadFailed, got an open dataset"),
    }
    Ok(())
}

#[test]
fn test_dataset_open_and_metadata() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("metadata.nc");
    create_t2m_file(&file_path, [0.0; 6])?;

    let source = DatasetSource::parse(file_path.to_str().expect("utf-8 path"))?;
    assert!(!source.is_remote());
    let file = open_dataset(&source)?;
    assert!(!file.is_downloaded());

    print_dataset(&file)?;
    list_variables_and_dimensions(&file)?;
    describe_variable(&file, "t2m")?;

    match describe_variable(&file, "non_existent") {
        Err(GridBinError::VariableNotFound { var }) => assert_eq!(var, "non_existent"),
        _ => panic!("Expected VariableNotFound error"),
    }

    let remote = DatasetSource::parse("https://example.com/data/test.nc")?;
    assert!(remote.is_remote());
    assert_eq!(remote.to_string(), "https://example.com/data/test.nc");
    assert!(DatasetSource::parse("  ").is_err());

    let missing = DatasetSource::parse("/non/existent/file.nc")?;
    assert!(matches!(open_dataset(&missing), Err(GridBinError::NetCDFError(_))));
    Ok(())
}
