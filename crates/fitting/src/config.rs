//! Declarative fit configuration read from JSON
//!
//! The configuration mirrors the flags a user would write by hand:
//!
//! ```json
//! {
//!   "masses": [
//!     {"value": 1.0079, "function": "GramCharlier", "width": [2, 5, 7],
//!      "hermite_coeffs": [1, 0, 0], "k_free": 0, "sears_flag": 1},
//!     {"value": 16.0, "function": "Gaussian", "width": 10}
//!   ],
//!   "background": {"function": "Polynomial", "order": 2},
//!   "intensity_constraints": [0, 1],
//!   "options": {"max_iterations": 5000}
//! }
//! ```
//!
//! Conversion goes through the same descriptor strings used by the boundary
//! tooling, so both routes are validated identically.

// crate modules
use crate::error::Result;
use crate::options::FitOptions;
use crate::spec::FitSpec;

// ncstools modules
use ncstools_profiles::DEFAULT_BACKGROUND;
use ncstools_utils::f;

// external crates
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Width given as a single value or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidthConfig {
    /// Fixed width
    Fixed(f64),
    /// `[min, default, max]`, or a single element list
    List(Vec<f64>),
}

impl std::fmt::Display for WidthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{value}"),
            Self::List(values) => write!(f, "[{}]", values.iter().join(", ")),
        }
    }
}

/// A single mass and its profile flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MassConfig {
    /// Atomic mass (amu)
    pub value: f64,
    /// Profile function, `Gaussian` or `GramCharlier`
    pub function: String,
    /// Width value or range
    pub width: WidthConfig,
    /// Hermite term activation flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hermite_coeffs: Option<Vec<u8>>,
    /// FSE coefficient free flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_free: Option<u8>,
    /// FSE coefficient tie flag when not free
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sears_flag: Option<u8>,
    /// Starting intensity for a Gaussian
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    /// Starting FSE coefficient for a Gram-Charlier expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fse_coeff: Option<f64>,
}

impl MassConfig {
    /// Descriptor form of the profile, without the mass value
    pub fn descriptor(&self) -> String {
        let mut s = f!("function={},width={}", self.function, self.width);
        if let Some(flags) = &self.hermite_coeffs {
            s += &f!(",hermite_coeffs=[{}]", flags.iter().join(", "));
        }
        if let Some(flag) = self.k_free {
            s += &f!(",k_free={flag}");
        }
        if let Some(flag) = self.sears_flag {
            s += &f!(",sears_flag={flag}");
        }
        if let Some(seed) = self.intensity {
            s += &f!(",intensity={seed}");
        }
        if let Some(seed) = self.fse_coeff {
            s += &f!(",fse_coeff={seed}");
        }
        s
    }
}

/// Background function and order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Function name, `Polynomial` if missing
    #[serde(default = "default_background")]
    pub function: String,
    /// Polynomial order, validated on conversion
    pub order: i64,
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// One constraint row or several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintsConfig {
    /// A single constraint
    Single(Vec<f64>),
    /// Several constraints
    Multiple(Vec<Vec<f64>>),
}

impl ConstraintsConfig {
    /// Descriptor form, i.e. `[0, 1];[1, -1]`
    pub fn descriptor(&self) -> String {
        let row = |values: &Vec<f64>| f!("[{}]", values.iter().join(", "));
        match self {
            Self::Single(values) if values.is_empty() => String::new(),
            Self::Single(values) => row(values),
            Self::Multiple(rows) => rows.iter().filter(|r| !r.is_empty()).map(row).join(";"),
        }
    }
}

/// Complete declarative fit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    /// Masses in fit order
    pub masses: Vec<MassConfig>,
    /// Optional background
    #[serde(default)]
    pub background: Option<BackgroundConfig>,
    /// Optional intensity constraints
    #[serde(default)]
    pub intensity_constraints: Option<ConstraintsConfig>,
    /// Spectrum index written into the profiles
    #[serde(default)]
    pub workspace_index: usize,
    /// Options for running the fit
    #[serde(default)]
    pub options: FitOptions,
}

impl FitConfig {
    /// Mass values in fit order
    pub fn mass_values(&self) -> Vec<f64> {
        self.masses.iter().map(|m| m.value).collect()
    }

    /// Semicolon separated profile descriptors
    pub fn profiles_descriptor(&self) -> String {
        self.masses.iter().map(|m| m.descriptor()).join(";")
    }

    /// Background descriptor, empty for none
    pub fn background_descriptor(&self) -> String {
        match &self.background {
            Some(b) => f!("function={},order={}", b.function, b.order),
            None => String::new(),
        }
    }

    /// Intensity constraint descriptor, empty for none
    pub fn intensity_constraints_descriptor(&self) -> String {
        self.intensity_constraints
            .as_ref()
            .map(|c| c.descriptor())
            .unwrap_or_default()
    }

    /// Validate and convert into the fit model and options
    ///
    /// ```rust
    /// # use ncstools_fitting::FitConfig;
    /// let config: FitConfig = serde_json::from_str(r#"{
    ///     "masses": [
    ///         {"value": 16.0, "function": "Gaussian", "width": 10},
    ///         {"value": 27.0, "function": "Gaussian", "width": [11, 13, 15]}
    ///     ],
    ///     "intensity_constraints": [1, -2]
    /// }"#).unwrap();
    ///
    /// let (spec, options) = config.build().unwrap();
    /// assert_eq!(spec.components().len(), 2);
    /// assert_eq!(spec.intensity_constraints().unwrap().nrows(), 1);
    /// assert_eq!(options.max_iterations, 5000);
    /// ```
    pub fn build(&self) -> Result<(FitSpec, FitOptions)> {
        let spec = FitSpec::from_descriptors(
            &self.mass_values(),
            &self.profiles_descriptor(),
            &self.background_descriptor(),
            &self.intensity_constraints_descriptor(),
            self.workspace_index,
        )?;
        self.options.validate()?;
        Ok((spec, self.options.clone()))
    }

    /// Serialise to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read a fit configuration from a JSON file
///
/// ```rust, no_run
/// # use ncstools_fitting::read_config;
/// let config = read_config("path/to/fit.json").unwrap();
/// let (spec, options) = config.build().unwrap();
/// ```
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<FitConfig> {
    let path: &Path = Path::new(path.as_ref());
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
