//! Side-by-side temperature map comparison
//!
//! Prepares everything a plotting front end needs to draw two 2 m temperature
//! fields next to each other on the same grid: cell edges for a mesh plot,
//! Celsius values, per-cell color classes, panel titles stamped with the valid
//! time, and the axis decoration shared by both panels.

use crate::colormap::{temperature_colormap, TemperatureColormap};
use crate::errors::{GridBinError, Result};
use crate::options::PlotOptions;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use ndarray::{Array2, ArrayD, Ix2};
use netcdf::{AttributeValue, File};
use tracing::{debug, error, info};

/// Offset between Kelvin and degrees Celsius
pub const KELVIN_OFFSET: f32 = 273.15;

/// Panel title defaults
pub const DEFAULT_LEFT_TITLE: &str = "input T2m";
pub const DEFAULT_RIGHT_TITLE: &str = "target T2m";

/// Figure size in inches
pub const FIGURE_SIZE: (f64, f64) = (12.0, 8.0);

/// Colorbar axes `[left, bottom, width, height]` in figure fractions
pub const COLORBAR_AXES: [f64; 4] = [0.92, 0.3, 0.02, 0.4];

/// Default level boundaries: -5 °C to 24 °C in 1 °C steps
#[must_use]
pub fn default_levels() -> Vec<f64> {
    arange(-5.0, 25.0, 1.0)
}

/// Evenly spaced values in `[start, stop)`, `ceil((stop - start) / step)` of them
#[must_use]
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let len = ((stop - start) / step).ceil();
    if !len.is_finite() || len <= 0.0 {
        return Vec::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let len = len as usize;
    (0..len).map(|i| start + step * i as f64).collect()
}

/// Round to two decimals, ties to even
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Cell edges around evenly spaced cell centres.
///
/// The spacing is taken from the first two centres, rounded to two decimals.
///
/// # Errors
///
/// Returns [`GridBinError::InvalidGrid`] with fewer than two centres or a zero
/// spacing.
pub fn cell_edges(centers: &[f64]) -> Result<Vec<f64>> {
    let (first, second, last) = match centers {
        [first, second, .., last] => (*first, *second, *last),
        [first, second] => (*first, *second, *second),
        _ => {
            return Err(GridBinError::InvalidGrid {
                message: format!("need at least 2 cell centres, got {}", centers.len()),
            })
        }
    };

    let step = round2(second - first);
    if step == 0.0 || !step.is_finite() {
        return Err(GridBinError::InvalidGrid {
            message: format!("cell spacing {step} between {first} and {second} is unusable"),
        });
    }

    Ok(arange(first - step / 2.0, last + step, step))
}

/// Decode a CF time value such as `6.0` in `"hours since 1979-01-01 00:00:00"`.
///
/// # Errors
///
/// Returns [`GridBinError::TimeDecode`] if the units are not
/// `<unit> since <reference>` with a known unit and parseable reference.
pub fn decode_cf_time(value: f64, units: &str) -> Result<NaiveDateTime> {
    let fail = |message: String| GridBinError::TimeDecode { message };

    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| fail(format!("units '{units}' are not '<unit> since <date>'")))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600.0,
        "days" | "day" | "d" => 86_400.0,
        other => return Err(fail(format!("unsupported time unit '{other}'"))),
    };

    let reference = parse_reference(reference)
        .ok_or_else(|| fail(format!("cannot parse reference date '{}'", reference.trim())))?;

    let millis = (value * seconds_per_unit * 1_000.0).round();
    #[allow(clippy::cast_possible_truncation)]
    let offset = TimeDelta::try_milliseconds(millis as i64)
        .filter(|_| millis.is_finite())
        .ok_or_else(|| fail(format!("time offset {value} {unit} is out of range")))?;

    reference
        .checked_add_signed(offset)
        .ok_or_else(|| fail(format!("time {value} {units} overflows the calendar")))
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = text
        .strip_suffix("UTC")
        .or_else(|| text.strip_suffix('Z'))
        .unwrap_or(text)
        .trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Title suffix for a valid time, truncated to the hour
#[must_use]
pub fn format_time_stamp(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:00 UTC").to_string()
}

/// `time`, `lat` and `lon` axes of a field
#[derive(Debug, Clone)]
pub struct FieldCoordinates {
    pub time: Vec<NaiveDateTime>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl FieldCoordinates {
    /// Read the coordinate axes from `file`.
    ///
    /// A failure is logged with `label` for context and returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if an axis is missing, unreadable, or the time axis
    /// carries no decodable CF `units`.
    pub fn from_file(file: &File, label: &str) -> Result<Self> {
        Self::read(file).map_err(|err| {
            error!(error = %err, "Failed to retrieve coordinates from {label}");
            err
        })
    }

    fn read(file: &File) -> Result<Self> {
        let time_var = file
            .variable("time")
            .ok_or_else(|| GridBinError::VariableNotFound {
                var: "time".to_string(),
            })?;
        let units = match time_var.attribute("units").map(|a| a.value()).transpose()? {
            Some(AttributeValue::Str(units)) => units,
            _ => {
                return Err(GridBinError::TimeDecode {
                    message: "time axis has no 'units' attribute".to_string(),
                })
            }
        };
        let time = time_var
            .get_values::<f64, _>(..)?
            .into_iter()
            .map(|value| decode_cf_time(value, &units))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            time,
            lat: read_axis(file, "lat")?,
            lon: read_axis(file, "lon")?,
        })
    }

    /// Time stamp of the first time step
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::TimeDecode`] for an empty time axis.
    pub fn time_stamp(&self) -> Result<String> {
        if self.time.len() > 1 {
            debug!(steps = self.time.len(), "using the first time step for titles");
        }
        self.time
            .first()
            .map(format_time_stamp)
            .ok_or_else(|| GridBinError::TimeDecode {
                message: "time axis is empty".to_string(),
            })
    }
}

fn read_axis(file: &File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| GridBinError::VariableNotFound {
            var: name.to_string(),
        })?;
    Ok(var.get_values::<f64, _>(..)?)
}

/// Read `var_name` as an `f32` array with its file shape.
///
/// # Errors
///
/// Returns an error if the variable is missing or unreadable.
pub fn read_field(file: &File, var_name: &str) -> Result<ArrayD<f32>> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridBinError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();
    let values = var.get_values::<f32, _>(..)?;
    Ok(ArrayD::from_shape_vec(shape, values)?)
}

/// Drop leading length-1 dimensions, leaving a `(lat, lon)` field.
///
/// # Errors
///
/// Returns [`GridBinError::InvalidGrid`] if the field has fewer than two
/// dimensions or more than one leading slice.
pub fn squeeze_to_2d(field: ArrayD<f32>) -> Result<Array2<f32>> {
    let shape = field.shape().to_vec();
    let ndim = shape.len();
    if ndim < 2 || shape[..ndim - 2].iter().product::<usize>() != 1 {
        return Err(GridBinError::InvalidGrid {
            message: format!("expected a single 2D slice, got shape {shape:?}"),
        });
    }
    let (rows, cols) = (shape[ndim - 2], shape[ndim - 1]);
    Ok(field
        .into_shape(vec![rows, cols])?
        .into_dimensionality::<Ix2>()?)
}

/// Kelvin to degrees Celsius
#[must_use]
pub fn kelvin_to_celsius(field: &Array2<f32>) -> Array2<f32> {
    field.mapv(|k| k - KELVIN_OFFSET)
}

/// Axis decoration for one map panel
#[derive(Debug, Clone, PartialEq)]
pub struct MapDecoration {
    pub coastline_width: f64,
    pub draw_borders: bool,
    pub x_ticks: Vec<f64>,
    pub y_ticks: Vec<f64>,
    /// `[lon_min, lon_max, lat_min, lat_max]`
    pub map_extent: [f64; 4],
    pub minor_ticks: bool,
    pub tick_label_size: f64,
    pub label_font_size: f64,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

impl MapDecoration {
    /// Central European map with 5° ticks
    #[must_use]
    pub fn new(plot_xlabel: bool, plot_ylabel: bool) -> Self {
        Self {
            coastline_width: 0.75,
            draw_borders: true,
            x_ticks: arange(0.0, 360.0 + 0.1, 5.0),
            y_ticks: arange(-90.0, 90.0 + 0.1, 5.0),
            map_extent: [3.5, 17.0, 44.5, 55.0],
            minor_ticks: true,
            tick_label_size: 12.0,
            label_font_size: 16.0,
            x_label: plot_xlabel.then(|| "Longitude [°E]".to_string()),
            y_label: plot_ylabel.then(|| "Latitude[°N]".to_string()),
        }
    }
}

impl Default for MapDecoration {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// One side of the comparison
#[derive(Debug, Clone)]
pub struct MapPanel {
    pub title: String,
    /// Temperature in °C, shape `(lat, lon)`
    pub celsius: Array2<f32>,
    /// Color class codes, see [`crate::colormap::ColorClass::code`]
    pub classes: Array2<i32>,
    pub decoration: MapDecoration,
}

impl MapPanel {
    fn build(
        title: String,
        field: ArrayD<f32>,
        grid: (usize, usize),
        colormap: &TemperatureColormap,
        decoration: MapDecoration,
    ) -> Result<Self> {
        let kelvin = squeeze_to_2d(field)?;
        if kelvin.dim() != grid {
            return Err(GridBinError::InvalidGrid {
                message: format!(
                    "field shape {:?} does not match the {}x{} lat/lon grid",
                    kelvin.dim(),
                    grid.0,
                    grid.1
                ),
            });
        }
        let celsius = kelvin_to_celsius(&kelvin);
        let ncolors = colormap.norm.ncolors();
        let classes = celsius.mapv(|v| colormap.norm.classify(f64::from(v)).code(ncolors));

        Ok(Self {
            title,
            celsius,
            classes,
            decoration,
        })
    }

    /// Finite minimum and maximum of the Celsius field
    #[must_use]
    pub fn range(&self) -> Option<(f32, f32)> {
        self.celsius
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Two temperature maps on a shared grid, colormap and colorbar
#[derive(Debug, Clone)]
pub struct MapComparison {
    pub lat_edges: Vec<f64>,
    pub lon_edges: Vec<f64>,
    pub time_stamp: String,
    pub left: MapPanel,
    pub right: MapPanel,
    pub colormap: TemperatureColormap,
    pub colorbar_ticks: Vec<f64>,
    pub figure_size: (f64, f64),
    pub colorbar_axes: [f64; 4],
}

impl MapComparison {
    /// Prepare `left_var` from `left` next to `right_var` from `right`.
    ///
    /// The grid and valid time come from the left field. Options read:
    /// `title1`, `title2` and `levels`.
    ///
    /// # Errors
    ///
    /// Returns an error if coordinates cannot be read, an option has the wrong
    /// type, the levels cannot form a colormap, or a field does not fit the grid.
    pub fn build(
        left: &File,
        left_var: &str,
        right: &File,
        right_var: &str,
        options: &PlotOptions,
    ) -> Result<Self> {
        let coords = FieldCoordinates::from_file(left, left_var)?;
        let time_stamp = coords.time_stamp()?;

        let lat_edges = cell_edges(&coords.lat)?;
        let lon_edges = cell_edges(&coords.lon)?;

        let title1: String = options.get_or("title1", DEFAULT_LEFT_TITLE.to_string())?;
        let title2: String = options.get_or("title2", DEFAULT_RIGHT_TITLE.to_string())?;
        let levels: Vec<f64> = options.get_or("levels", default_levels())?;

        let colormap = temperature_colormap(&levels)?;
        let grid = (coords.lat.len(), coords.lon.len());

        info!(
            "🗺  Preparing comparison of '{}' and '{}' on a {}x{} grid at {}",
            left_var, right_var, grid.0, grid.1, time_stamp
        );

        let left_panel = MapPanel::build(
            format!("{title1}, {time_stamp}"),
            read_field(left, left_var)?,
            grid,
            &colormap,
            MapDecoration::new(true, true),
        )?;
        let right_panel = MapPanel::build(
            format!("{title2}, {time_stamp}"),
            read_field(right, right_var)?,
            grid,
            &colormap,
            MapDecoration::new(true, false),
        )?;

        Ok(Self {
            lat_edges,
            lon_edges,
            time_stamp,
            left: left_panel,
            right: right_panel,
            colorbar_ticks: colormap.colorbar_ticks(),
            colormap,
            figure_size: FIGURE_SIZE,
            colorbar_axes: COLORBAR_AXES,
        })
    }

    /// Print a short report of both panels
    pub fn print_summary(&self) {
        println!("\n Map Comparison ({})", self.time_stamp);
        println!("==============================");
        println!(
            " Grid: {} x {} cells",
            self.lat_edges.len().saturating_sub(1),
            self.lon_edges.len().saturating_sub(1)
        );
        println!(
            " Colormap: {} ({} levels)",
            self.colormap.colormap.name,
            self.colormap.bounds.len()
        );
        for panel in [&self.left, &self.right] {
            match panel.range() {
                Some((lo, hi)) => println!("    {}: {:.2} to {:.2} °C", panel.title, lo, hi),
                None => println!("    {}: (no finite values)", panel.title),
            }
        }
    }
}
