//! Centralized error handling for GridBin
//!
//! Every fallible operation in the crate returns [`Result`], so callers get a
//! single error type with enough context to report what went wrong.

use std::fmt;

/// Main error type for GridBin operations
#[derive(Debug)]
pub enum GridBinError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Plot option file could not be parsed
    JsonError(serde_json::Error),

    /// HTTP request for a remote dataset failed
    HttpError(reqwest::Error),

    /// Server answered a dataset download with a non-success status
    DownloadFailed { url: String, status: u16 },

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Two sequences that must pair up element-wise have different lengths
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Bounds cannot be derived from an empty sample set
    EmptySamples,

    /// Raster width or height of zero
    InvalidRasterSize { nx: usize, ny: usize },

    /// A sample mapped to a pixel index outside the raster
    PixelOutOfRange {
        axis: char,
        index: i64,
        len: usize,
    },

    /// Required key absent from a plot option mapping
    MissingOption { key: String },

    /// Optional lookup called without a default value
    MissingDefault { key: String },

    /// Plot option present but of the wrong kind
    OptionType { key: String, expected: &'static str },

    /// Coordinate axis unusable for building cell edges
    InvalidGrid { message: String },

    /// CF time axis could not be decoded
    TimeDecode { message: String },

    /// Colormap or boundary normalisation misconfigured
    InvalidColormap { message: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error for ad-hoc messages
    Generic(String),
}

impl fmt::Display for GridBinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridBinError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GridBinError::IoError(e) => write!(f, "I/O error: {}", e),
            GridBinError::ArrayError(e) => write!(f, "Array error: {}", e),
            GridBinError::JsonError(e) => write!(f, "Option file error: {}", e),
            GridBinError::HttpError(e) => write!(f, "HTTP error: {}", e),
            GridBinError::DownloadFailed { url, status } => {
                write!(f, "Failed to download '{}': HTTP status {}", url, status)
            }
            GridBinError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            GridBinError::LengthMismatch {
                what,
                expected,
                found,
            } => write!(
                f,
                "Length mismatch for {}: expected {} values, found {}",
                what, expected, found
            ),
            GridBinError::EmptySamples => {
                write!(f, "Cannot derive an extent from an empty sample set")
            }
            GridBinError::InvalidRasterSize { nx, ny } => {
                write!(f, "Invalid raster size {}x{}: both sides must be >= 1", nx, ny)
            }
            GridBinError::PixelOutOfRange { axis, index, len } => write!(
                f,
                "Pixel index {} on axis '{}' is outside a raster of length {}",
                index, axis, len
            ),
            GridBinError::MissingOption { key } => {
                write!(f, "Could not find '{}' in input dictionary.", key)
            }
            GridBinError::MissingDefault { key } => write!(
                f,
                "Provide default when existence of key '{}' in dictionary is not required.",
                key
            ),
            GridBinError::OptionType { key, expected } => {
                write!(f, "Option '{}' is not a {}", key, expected)
            }
            GridBinError::InvalidGrid { message } => write!(f, "Invalid grid: {}", message),
            GridBinError::TimeDecode { message } => {
                write!(f, "Time decoding error: {}", message)
            }
            GridBinError::InvalidColormap { message } => {
                write!(f, "Invalid colormap: {}", message)
            }
            GridBinError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GridBinError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GridBinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridBinError::NetCDFError(e) => Some(e),
            GridBinError::IoError(e) => Some(e),
            GridBinError::ArrayError(e) => Some(e),
            GridBinError::JsonError(e) => Some(e),
            GridBinError::HttpError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridBinError {
    fn from(error: netcdf::Error) -> Self {
        GridBinError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridBinError {
    fn from(error: std::io::Error) -> Self {
        GridBinError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GridBinError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridBinError::ArrayError(error)
    }
}

impl From<serde_json::Error> for GridBinError {
    fn from(error: serde_json::Error) -> Self {
        GridBinError::JsonError(error)
    }
}

impl From<reqwest::Error> for GridBinError {
    fn from(error: reqwest::Error) -> Self {
        GridBinError::HttpError(error)
    }
}

impl From<String> for GridBinError {
    fn from(error: String) -> Self {
        GridBinError::Generic(error)
    }
}

impl From<&str> for GridBinError {
    fn from(error: &str) -> Self {
        GridBinError::Generic(error.to_string())
    }
}

/// Result type alias for GridBin operations
pub type Result<T> = std::result::Result<T, GridBinError>;
