// crate modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named parameter values keyed by their full composite name
///
/// Keys carry the component prefix, e.g. `f0.Width` or `f3.A1`. The table is
/// used to seed the all-free rendering of the composite function, either from
/// a previous fit or from the declared defaults.
///
/// ```rust
/// # use ncstools_profiles::ParameterValues;
/// let mut values = ParameterValues::new();
/// values.insert("f0.Width", 4.8);
///
/// assert_eq!(values.get("f0.Width"), Some(4.8));
/// assert!(values.require("f0.Intensity").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValues(BTreeMap<String, f64>);

impl ParameterValues {
    /// Create an empty value table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a named value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Get a value if it exists
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Get a value that must exist
    ///
    /// A missing key means the value table does not belong to the components
    /// it is being paired with, which is always fatal.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    /// Check if a name is in the table
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of values in the table
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the table contains no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}
