//! Opening NetCDF datasets from a path or URL
//!
//! Remote datasets are downloaded into a scratch file first and opened from
//! there. The scratch file lives exactly as long as the opened [`Dataset`].

use crate::errors::{GridBinError, Result};
use netcdf::File;
use std::fmt;
use std::io::Write;
use std::ops::Deref;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::info;

/// Where a dataset lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// File on the local filesystem
    Local(PathBuf),
    /// `http(s)://` URL of a NetCDF file
    Remote(String),
}

impl DatasetSource {
    /// Classify `location` by its scheme.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::Generic`] for an empty location.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(GridBinError::Generic(
                "Dataset location is empty".to_string(),
            ));
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(Self::Remote(location.to_string()))
        } else {
            Ok(Self::Local(PathBuf::from(location)))
        }
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// An open NetCDF file, plus the scratch copy backing it for remote sources.
///
/// Dereferences to [`netcdf::File`].
pub struct Dataset {
    // declared first so the handle closes before the scratch file is removed
    file: File,
    download: Option<NamedTempFile>,
}

impl Dataset {
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Whether the dataset was fetched into a scratch file
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        self.download.is_some()
    }
}

impl Deref for Dataset {
    type Target = File;

    fn deref(&self) -> &File {
        &self.file
    }
}

/// Download `url` into a scratch `.nc` file.
///
/// # Errors
///
/// Returns [`GridBinError::HttpError`] if the request fails,
/// [`GridBinError::DownloadFailed`] for a non-success status, or
/// [`GridBinError::IoError`] if the scratch file cannot be written.
pub fn download_to_temp(url: &str) -> Result<NamedTempFile> {
    let mut response = reqwest::blocking::get(url)?;

    let status = response.status();
    if !status.is_success() {
        return Err(GridBinError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut scratch = tempfile::Builder::new()
        .prefix("gridbin-")
        .suffix(".nc")
        .tempfile()?;
    let bytes = response.copy_to(&mut scratch)?;
    scratch.flush()?;

    info!("⬇️  Downloaded {} bytes from {}", bytes, url);
    Ok(scratch)
}

/// Open the dataset at `source`, downloading it first when remote.
///
/// # Errors
///
/// Returns [`GridBinError::NetCDFError`] if libnetcdf cannot open it, or a
/// download error for remote sources.
pub fn open_dataset(source: &DatasetSource) -> Result<Dataset> {
    let dataset = match source {
        DatasetSource::Local(path) => Dataset {
            file: netcdf::open(path)?,
            download: None,
        },
        DatasetSource::Remote(url) => {
            let scratch = download_to_temp(url)?;
            Dataset {
                file: netcdf::open(scratch.path())?,
                download: Some(scratch),
            }
        }
    };
    info!("📂 Opened dataset {}", source);
    Ok(dataset)
}
