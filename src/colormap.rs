//! Discrete colormaps for temperature maps
//!
//! Builds a listed colormap by sampling the reversed PuOr diverging map once
//! per level boundary, plus the boundary normalisation that assigns each data
//! value a color slot. The lookup behaviour mirrors matplotlib so maps match
//! figures produced there.

use crate::errors::{GridBinError, Result};

/// Lookup table size for continuous colormaps
pub const LUT_SIZE: usize = 256;

/// RGBA color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// `#rrggbb` with channels rounded to 8 bits
    #[must_use]
    pub fn to_hex(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

// ColorBrewer PuOr, orange end first
const PUOR_ANCHORS: [(f64, f64, f64); 11] = [
    (0.498_039_215_686_274_5, 0.231_372_549_019_607_85, 0.031_372_549_019_607_84),
    (0.701_960_784_313_725_4, 0.345_098_039_215_686_27, 0.023_529_411_764_705_88),
    (0.878_431_372_549_019_6, 0.509_803_921_568_627_4, 0.078_431_372_549_019_61),
    (0.992_156_862_745_098_1, 0.721_568_627_450_980_4, 0.388_235_294_117_647_07),
    (0.996_078_431_372_549, 0.878_431_372_549_019_6, 0.713_725_490_196_078_4),
    (0.968_627_450_980_392_2, 0.968_627_450_980_392_2, 0.968_627_450_980_392_2),
    (0.847_058_823_529_411_8, 0.854_901_960_784_313_7, 0.921_568_627_450_980_3),
    (0.698_039_215_686_274_5, 0.670_588_235_294_117_6, 0.823_529_411_764_705_8),
    (0.501_960_784_313_725_5, 0.450_980_392_156_862_75, 0.674_509_803_921_568_7),
    (0.329_411_764_705_882_35, 0.152_941_176_470_588_25, 0.533_333_333_333_333_3),
    (0.176_470_588_235_294_13, 0.0, 0.294_117_647_058_823_54),
];

/// Continuous colormap backed by a lookup table
pub trait Colormap {
    /// Colormap name
    fn name(&self) -> &str;

    /// Color at `value` in `[0, 1]`; values outside are clipped
    fn at(&self, value: f64) -> Rgba;

    /// `n` colors evenly spaced over the whole map
    fn sample(&self, n: usize) -> Vec<Rgba> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.0)],
            _ => (0..n)
                .map(|i| self.at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

/// The PuOr diverging colormap, optionally reversed (`PuOr_r`)
#[derive(Debug, Clone)]
pub struct PuOr {
    name: &'static str,
    lut: Vec<Rgba>,
}

impl PuOr {
    #[must_use]
    pub fn new() -> Self {
        let anchors: Vec<Rgba> = PUOR_ANCHORS
            .iter()
            .map(|&(r, g, b)| Rgba::new(r, g, b, 1.0))
            .collect();
        Self {
            name: "PuOr",
            lut: build_lut(&anchors, LUT_SIZE),
        }
    }

    /// Purple end first
    #[must_use]
    pub fn reversed() -> Self {
        let mut map = Self::new();
        map.lut.reverse();
        map.name = "PuOr_r";
        map
    }
}

impl Default for PuOr {
    fn default() -> Self {
        Self::new()
    }
}

impl Colormap for PuOr {
    fn name(&self) -> &str {
        self.name
    }

    fn at(&self, value: f64) -> Rgba {
        let n = self.lut.len();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = if value.is_nan() || value <= 0.0 {
            0
        } else {
            ((value * n as f64) as usize).min(n - 1)
        };
        self.lut[index]
    }
}

/// Evenly spaced anchors linearly interpolated onto `size` entries
fn build_lut(anchors: &[Rgba], size: usize) -> Vec<Rgba> {
    let segments = anchors.len() - 1;
    (0..size)
        .map(|i| {
            let x = if size == 1 {
                0.0
            } else {
                i as f64 / (size - 1) as f64
            };
            let position = x * segments as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lower = (position.floor() as usize).min(segments - 1);
            anchors[lower].lerp(anchors[lower + 1], position - lower as f64)
        })
        .collect()
}

/// Where a value falls relative to the colormap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Below the lowest boundary
    Under,
    /// Color slot inside the listed colormap
    Index(usize),
    /// At or above the highest boundary
    Over,
    /// NaN
    Bad,
}

impl ColorClass {
    /// Integer code: slot index, `-1` under, `ncolors` over, `-2` bad
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn code(self, ncolors: usize) -> i32 {
        match self {
            Self::Under => -1,
            Self::Index(i) => i as i32,
            Self::Over => ncolors as i32,
            Self::Bad => -2,
        }
    }
}

/// Fixed list of colors
#[derive(Debug, Clone, PartialEq)]
pub struct ListedColormap {
    pub name: String,
    pub colors: Vec<Rgba>,
}

impl ListedColormap {
    #[must_use]
    pub fn new(name: impl Into<String>, colors: Vec<Rgba>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Number of colors
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for a classified value. Under and over reuse the end colors.
    #[must_use]
    pub fn color(&self, class: ColorClass) -> Rgba {
        let fallback = Rgba::transparent();
        match class {
            ColorClass::Under => self.colors.first().copied().unwrap_or(fallback),
            ColorClass::Over => self.colors.last().copied().unwrap_or(fallback),
            ColorClass::Index(i) => self.colors.get(i).copied().unwrap_or(fallback),
            ColorClass::Bad => fallback,
        }
    }
}

/// Maps values to color slots by the boundary interval they fall in
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryNorm {
    boundaries: Vec<f64>,
    ncolors: usize,
}

impl BoundaryNorm {
    /// # Errors
    ///
    /// Returns [`GridBinError::InvalidColormap`] if there are fewer than two
    /// boundaries, they are not strictly increasing, or there are fewer colors
    /// than intervals.
    pub fn new(boundaries: Vec<f64>, ncolors: usize) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(GridBinError::InvalidColormap {
                message: "You must provide at least 2 boundaries".to_string(),
            });
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1] || w[0].is_nan() || w[1].is_nan()) {
            return Err(GridBinError::InvalidColormap {
                message: "boundaries must be strictly increasing".to_string(),
            });
        }
        let regions = boundaries.len() - 1;
        if ncolors < regions {
            return Err(GridBinError::InvalidColormap {
                message: format!(
                    "there are {ncolors} colors but {regions} boundary intervals"
                ),
            });
        }
        Ok(Self {
            boundaries,
            ncolors,
        })
    }

    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    #[must_use]
    pub const fn ncolors(&self) -> usize {
        self.ncolors
    }

    fn regions(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Color slot for `value`.
    ///
    /// With more colors than intervals, interval `k` is spread to slot
    /// `floor((ncolors - 1) / (regions - 1) * k)` so the whole colormap is
    /// used; a single interval maps to the middle color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn classify(&self, value: f64) -> ColorClass {
        if value.is_nan() {
            return ColorClass::Bad;
        }
        let (first, last) = (self.boundaries[0], self.boundaries[self.regions()]);
        if value < first {
            return ColorClass::Under;
        }
        if value >= last {
            return ColorClass::Over;
        }

        // value >= first, so at least one boundary is <= value
        let region = self.boundaries.iter().take_while(|&&b| b <= value).count() - 1;
        let regions = self.regions();
        let slot = if self.ncolors > regions {
            if regions == 1 {
                (self.ncolors - 1) / 2
            } else {
                let spread = (self.ncolors - 1) as f64 / (regions - 1) as f64;
                (spread * region as f64) as usize
            }
        } else {
            region
        };
        ColorClass::Index(slot)
    }
}

/// Colormap, normalisation and level boundaries for temperature maps
#[derive(Debug, Clone)]
pub struct TemperatureColormap {
    pub colormap: ListedColormap,
    pub norm: BoundaryNorm,
    pub bounds: Vec<f64>,
}

impl TemperatureColormap {
    /// Colorbar ticks: every second boundary starting from the second
    #[must_use]
    pub fn colorbar_ticks(&self) -> Vec<f64> {
        self.bounds.iter().skip(1).step_by(2).copied().collect()
    }

    /// Color for `value`
    #[must_use]
    pub fn color_of(&self, value: f64) -> Rgba {
        self.colormap.color(self.norm.classify(value))
    }
}

/// Discrete temperature colormap with one `PuOr_r` color per level boundary.
///
/// # Errors
///
/// Returns [`GridBinError::InvalidColormap`] if the levels cannot form a
/// boundary normalisation.
pub fn temperature_colormap(levels: &[f64]) -> Result<TemperatureColormap> {
    let bounds = levels.to_vec();
    let colors = PuOr::reversed().sample(bounds.len());
    let colormap = ListedColormap::new("temp_map", colors);
    let norm = BoundaryNorm::new(bounds.clone(), colormap.len())?;

    Ok(TemperatureColormap {
        colormap,
        norm,
        bounds,
    })
}
