// crate modules
use crate::data::FitCurve;
use crate::error::Result;
use crate::optimizer::ParameterTable;

// ncstools modules
use ncstools_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// Raw output of a complete fit
///
/// The parameter table is exactly what the final optimizer call returned.
/// Physical quantities are derived from it elsewhere and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Name of the fit output, unique to the spectrum fitted
    pub name: String,
    /// Reduced chi-square of the final evaluation
    pub reduced_chi_square: f64,
    /// Parameter table of the final evaluation
    pub parameters: ParameterTable,
    /// Calculated curve in physical units, when available
    pub curve: Option<FitCurve>,
}

impl FitResult {
    /// Serialise to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read back from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for FitResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("Fit result '{}'\n", self.name);
        s += &f!("  Reduced Chi-Square = {:.6}\n", self.reduced_chi_square);
        for row in &self.parameters {
            s += &f!("  {row}\n");
        }
        write!(f, "{}", s.trim_end())
    }
}
