//! Plot option lookup with defaults
//!
//! Plot settings arrive as a loose string-keyed mapping, usually read from a
//! JSON file. Lookups either fall back to a caller-supplied default or insist
//! on the key being present.

use crate::errors::{GridBinError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::error;

/// A single plot option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(f64),
    Text(String),
    Levels(Vec<f64>),
}

impl OptionValue {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Levels(_) => "list of numbers",
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<f64>> for OptionValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Levels(value)
    }
}

/// Types that can be pulled out of an [`OptionValue`]
pub trait FromOptionValue: Sized {
    /// Name used in type mismatch errors
    const EXPECTED: &'static str;

    fn from_option_value(value: &OptionValue) -> Option<Self>;
}

impl FromOptionValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_option_value(value: &OptionValue) -> Option<Self> {
        match value {
            OptionValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromOptionValue for String {
    const EXPECTED: &'static str = "string";

    fn from_option_value(value: &OptionValue) -> Option<Self> {
        match value {
            OptionValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromOptionValue for Vec<f64> {
    const EXPECTED: &'static str = "list of numbers";

    fn from_option_value(value: &OptionValue) -> Option<Self> {
        match value {
            OptionValue::Levels(levels) => Some(levels.clone()),
            // a lone number is a one-element list
            OptionValue::Number(v) => Some(vec![*v]),
            OptionValue::Text(_) => None,
        }
    }
}

/// String-keyed plot options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotOptions {
    values: BTreeMap<String, OptionValue>,
}

impl PlotOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::JsonError`] if the text is not a JSON object of
    /// numbers, strings and number lists.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value stored under `key`, or `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::OptionType`] if the stored value has the wrong kind.
    pub fn get_or<T: FromOptionValue>(&self, key: &str, default: T) -> Result<T> {
        provide_default(self, key, Some(default), false)
    }

    /// Value stored under `key`, which must be present.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::MissingOption`] if the key is absent, or
    /// [`GridBinError::OptionType`] if the stored value has the wrong kind.
    pub fn require<T: FromOptionValue>(&self, key: &str) -> Result<T> {
        provide_default(self, key, None, true)
    }
}

/// Look up `key`, falling back to `default` unless the key is `required`.
///
/// A lookup that is neither required nor given a default is a caller bug and
/// fails straight away. A missing required key logs the whole mapping before
/// failing.
///
/// # Errors
///
/// Returns an error if:
/// - `required` is false and `default` is `None`
/// - `required` is true and `key` is absent
/// - the stored value cannot be converted to `T`
pub fn provide_default<T: FromOptionValue>(
    options: &PlotOptions,
    key: &str,
    default: Option<T>,
    required: bool,
) -> Result<T> {
    if !required && default.is_none() {
        return Err(GridBinError::MissingDefault {
            key: key.to_string(),
        });
    }

    match options.raw(key) {
        Some(value) => T::from_option_value(value).ok_or_else(|| {
            error!(key, found = value.kind(), "plot option has the wrong type");
            GridBinError::OptionType {
                key: key.to_string(),
                expected: T::EXPECTED,
            }
        }),
        None if required => {
            error!(options = ?options, key, "required plot option missing");
            Err(GridBinError::MissingOption {
                key: key.to_string(),
            })
        }
        None => default.ok_or_else(|| GridBinError::MissingDefault {
            key: key.to_string(),
        }),
    }
}
