// crate modules
use crate::data::DomainScale;
use crate::error::{Error, Result};

// ncstools modules
use ncstools_utils::OptionExt;

// external crates
use serde::{Deserialize, Serialize};

/// Default iteration budget for the first fit stage
pub const DEFAULT_MAX_ITERATIONS: u32 = 5000;

/// Default minimizer and tolerances
pub const DEFAULT_MINIMIZER: &str = "Levenberg-Marquardt,AbsError=1e-08,RelError=1e-08";

/// Default multiplier applied to the x domain going into the optimizer
pub const DEFAULT_DOMAIN_SCALE: f64 = 1e-6;

/// Settings for running a fit that are unrelated to the model itself
///
/// Missing fields take their defaults when deserialised.
///
/// ```rust
/// # use ncstools_fitting::FitOptions;
/// let options: FitOptions = serde_json::from_str(r#"{"smooth_points": 3}"#).unwrap();
///
/// assert_eq!(options.max_iterations, 5000);
/// assert_eq!(options.smooth_points, Some(3));
/// assert!(options.bad_data_error.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitOptions {
    /// Iteration budget for the first stage
    pub max_iterations: u32,
    /// Minimizer name and tolerances passed through to the optimizer
    pub minimizer: String,
    /// Multiplier applied to x going into the optimizer
    pub domain_scale: f64,
    /// Number of neighbours to smooth over, if any
    pub smooth_points: Option<i32>,
    /// Points with errors above this are masked out of the fit
    pub bad_data_error: Option<f64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            minimizer: DEFAULT_MINIMIZER.to_string(),
            domain_scale: DEFAULT_DOMAIN_SCALE,
            smooth_points: None,
            bad_data_error: None,
        }
    }
}

impl FitOptions {
    /// Check every option is usable before any data is touched
    pub fn validate(&self) -> Result<()> {
        if let Some(points) = self.smooth_points {
            if points <= 0 {
                return Err(Error::InvalidSmoothing(points));
            }
        }

        if let Some(threshold) = self.bad_data_error {
            if !(threshold >= 0.0 && threshold.is_finite()) {
                return Err(Error::InvalidThreshold(threshold));
            }
        }

        self.scale()?;
        Ok(())
    }

    /// Validated x-domain scale
    pub fn scale(&self) -> Result<DomainScale> {
        DomainScale::new(self.domain_scale)
    }
}

impl std::fmt::Display for FitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Fit options:")?;
        writeln!(f, "  max iterations: {}", self.max_iterations)?;
        writeln!(f, "  minimizer:      {}", self.minimizer)?;
        writeln!(f, "  domain scale:   {:e}", self.domain_scale)?;
        writeln!(f, "  smooth points:  {}", self.smooth_points.display_or("off"))?;
        write!(f, "  bad data error: {}", self.bad_data_error.display_or("no mask"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FitOptions::default().validate().is_ok());
    }

    #[test]
    fn invalid_options() {
        let options = FitOptions {
            smooth_points: Some(0),
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidSmoothing(0))));

        let options = FitOptions {
            domain_scale: -1.0,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidScale(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<FitOptions>(r#"{"max_iter": 10}"#).is_err());
    }
}
