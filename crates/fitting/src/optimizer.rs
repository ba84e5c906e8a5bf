//! The boundary with the external least-squares optimizer
//!
//! The optimizer itself is not part of this crate. Anything able to take a
//! composite function string and a [Dataset] and return a table of fitted
//! parameters can be plugged into the
//! [FitDriver](crate::FitDriver) by implementing [Optimizer].

// crate modules
use crate::data::Dataset;

// ncstools modules
use ncstools_profiles::ParameterValues;
use ncstools_utils::ValueExt;

// external crates
use serde::{Deserialize, Serialize};

/// Failures reported by an optimizer
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("minimizer did not converge within {0} iterations")]
    NotConverged(u32),

    #[error("malformed function string: {0}")]
    MalformedFunction(String),

    #[error("{0}")]
    Other(String),
}

/// A single fitted parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    /// Full composite name, e.g. `f0.Width`
    pub name: String,
    /// Fitted value
    pub value: f64,
    /// Symmetric error estimate
    pub error: f64,
}

impl ParameterRow {
    /// Convenience constructor
    pub fn new(name: &str, value: f64, error: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            error,
        }
    }
}

impl std::fmt::Display for ParameterRow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:<16} {} {}",
            self.name,
            self.value.sci(5, 2),
            self.error.sci(5, 2)
        )
    }
}

/// Ordered rows of (name, value, error) as returned by the optimizer
///
/// This is the only thing that crosses the optimizer boundary. Everything
/// derived from it is computed separately and never written back.
///
/// ```rust
/// # use ncstools_fitting::{ParameterRow, ParameterTable};
/// let table = ParameterTable::new(vec![
///     ParameterRow::new("f0.Width", 4.8, 0.1),
///     ParameterRow::new("f0.C_0", 0.92, 0.02),
/// ]);
///
/// assert_eq!(table.get("f0.Width").unwrap().value, 4.8);
/// assert_eq!(table.values().get("f0.C_0"), Some(0.92));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    rows: Vec<ParameterRow>,
}

impl ParameterTable {
    /// Create a table from rows, keeping their order
    pub fn new(rows: Vec<ParameterRow>) -> Self {
        Self { rows }
    }

    /// All rows in optimizer order
    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    /// Find a row by its full name
    pub fn get(&self, name: &str) -> Option<&ParameterRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Name to value lookup, used to seed the next stage
    pub fn values(&self) -> ParameterValues {
        self.rows
            .iter()
            .map(|row| (row.name.as_str(), row.value))
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a ParameterTable {
    type Item = &'a ParameterRow;
    type IntoIter = std::slice::Iter<'a, ParameterRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<ParameterRow> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = ParameterRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Everything the optimizer needs for a single call
#[derive(Debug, Clone, PartialEq)]
pub struct FitRequest {
    /// Composite function string
    pub function: String,
    /// Comma separated ties, empty for none
    pub ties: String,
    /// Comma separated constraints, empty for none
    pub constraints: String,
    /// Iteration budget, where zero only evaluates the function
    pub max_iterations: u32,
    /// Minimizer name and tolerances
    pub minimizer: String,
    /// Name for any output the optimizer creates
    pub output: String,
}

/// Successful optimizer output
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOutput {
    /// Fitted parameters
    pub parameters: ParameterTable,
    /// Goodness of fit
    pub reduced_chi_square: f64,
    /// Calculated curve at the data points, if the optimizer provides one
    pub calculated: Option<Vec<f64>>,
}

/// A blocking least-squares optimizer
///
/// The data passed in has already been preprocessed and rescaled, so
/// implementations should use it as-is.
pub trait Optimizer {
    /// Fit the function described by `request` to `data`
    fn fit(
        &mut self,
        request: &FitRequest,
        data: &Dataset,
    ) -> core::result::Result<OptimizerOutput, OptimizerError>;
}

impl<O: Optimizer + ?Sized> Optimizer for &mut O {
    fn fit(
        &mut self,
        request: &FitRequest,
        data: &Dataset,
    ) -> core::result::Result<OptimizerOutput, OptimizerError> {
        (**self).fit(request, data)
    }
}
