//! Raster extent handling
//!
//! The extent is the `[x_min, x_max, y_min, y_max]` box that maps continuous
//! coordinates onto pixel indices. Callers either pass exactly four bounds or
//! nothing, in which case the bounds come from the samples themselves.

use crate::errors::{GridBinError, Result};
use tracing::warn;

/// Rectangular bounding box used to map coordinates to pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Extent {
    #[must_use]
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Bounds spanning the samples.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::EmptySamples`] when either sequence is empty.
    pub fn from_samples(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(GridBinError::EmptySamples);
        }

        let (x_min, x_max) = min_max(x);
        let (y_min, y_max) = min_max(y);
        Ok(Self::new(x_min, x_max, y_min, y_max))
    }

    /// `[x_min, x_max, y_min, y_max]`, the order plotting libraries expect
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.x_min, self.x_max, self.y_min, self.y_max]
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// How the caller specified the extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtentSpec {
    /// No extent given; bounds come from the data
    Derived,
    /// Exactly four bounds given
    Explicit(Extent),
    /// Wrong number of values; treated like `Derived` after a warning
    Malformed(usize),
}

impl ExtentSpec {
    /// Classify a caller-supplied extent slice by its length.
    #[must_use]
    pub fn from_slice(extent: &[f64]) -> Self {
        match extent {
            [] => Self::Derived,
            [x_min, x_max, y_min, y_max] => {
                Self::Explicit(Extent::new(*x_min, *x_max, *y_min, *y_max))
            }
            other => Self::Malformed(other.len()),
        }
    }

    /// Whether pixel indices past the far edge get clamped.
    ///
    /// Only an explicit extent clamps; derived bounds cannot produce such
    /// indices, and a malformed extent behaves exactly like a derived one.
    #[must_use]
    pub const fn clamps_far_edge(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }

    /// Bounds to bin with, given the already NaN-cleaned coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::EmptySamples`] when bounds must be derived from
    /// an empty sample set.
    pub fn resolve(&self, x: &[f64], y: &[f64]) -> Result<Extent> {
        match self {
            Self::Explicit(extent) => Ok(*extent),
            Self::Derived => Extent::from_samples(x, y),
            Self::Malformed(len) => {
                warn!(
                    len = *len,
                    "extent incorrectly specified (expected 0 or 4 values), deriving bounds from data"
                );
                Extent::from_samples(x, y)
            }
        }
    }
}
