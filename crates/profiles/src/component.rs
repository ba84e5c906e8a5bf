//! Mass components and their line-shape models

// crate modules
use crate::error::{Error, Result};
use crate::fragment::{AttributeValue, Fragment};
use crate::values::ParameterValues;

// ncstools modules
use ncstools_utils::f;

// external crates
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Scaling between the width and a tied final-state-effect coefficient
///
/// The harmonic oscillator estimate of the FSE coefficient is
/// `k = width * sqrt(2) / 12`.
pub const SEARS_FACTOR: f64 = std::f64::consts::SQRT_2 / 12.0;

/// Width of the momentum distribution
///
/// A single value fixes the width, while a `[min, default, max]` triple leaves
/// it free within bounds, starting from the default.
///
/// ```rust
/// # use ncstools_profiles::WidthSpec;
/// // Either a fixed value
/// let fixed = WidthSpec::from_values(&[10.0]).unwrap();
/// assert_eq!(fixed, WidthSpec::Fixed(10.0));
///
/// // Or a bounded range
/// let range = WidthSpec::from_values(&[2.0, 5.0, 7.0]).unwrap();
/// assert_eq!(range.default_value(), 5.0);
///
/// // Anything else is a configuration error
/// assert!(WidthSpec::from_values(&[2.0, 5.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WidthSpec {
    /// Width is held at this value
    Fixed(f64),
    /// Width is free between `min` and `max`, starting from `default`
    Range { min: f64, default: f64, max: f64 },
}

impl WidthSpec {
    /// Infer the width specification from a list of values
    pub fn from_values(values: &[f64]) -> Result<Self> {
        match *values {
            [value] => Ok(Self::Fixed(value)),
            [min, default, max] => {
                if min <= default && default <= max {
                    Ok(Self::Range { min, default, max })
                } else {
                    Err(Error::UnorderedWidth { min, default, max })
                }
            }
            _ => Err(Error::MalformedWidth(values.len())),
        }
    }

    /// Starting value for the width
    pub fn default_value(&self) -> f64 {
        match *self {
            Self::Fixed(value) => value,
            Self::Range { default, .. } => default,
        }
    }

    /// True for a fixed width
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

impl std::fmt::Display for WidthSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => write!(f, "{value}"),
            Self::Range { min, default, max } => write!(f, "[{min}, {default}, {max}]"),
        }
    }
}

/// The `sears_flag` for a fixed final-state-effect coefficient
///
/// - [SearsFlag::Off] ties the coefficient to `0`
/// - [SearsFlag::On] ties the coefficient to `Width*sqrt(2)/12`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearsFlag {
    Off = 0,
    On = 1,
}

impl TryFrom<u8> for SearsFlag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            _ => Err(Error::InvalidFlag {
                flag: "sears_flag".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Treatment of the final-state-effect (FSE) coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FseMode {
    /// Fitted independently (`k_free=1`)
    Free,
    /// Tied to a fixed relation (`k_free=0`)
    Fixed(SearsFlag),
}

impl FseMode {
    /// Value of a fixed coefficient for a given width
    ///
    /// Returns `None` for a free coefficient, which has no closed form.
    pub fn fixed_value(&self, width: f64) -> Option<f64> {
        match self {
            Self::Free => None,
            Self::Fixed(SearsFlag::Off) => Some(0.0),
            Self::Fixed(SearsFlag::On) => Some(width * SEARS_FACTOR),
        }
    }
}

/// Gram-Charlier expansion specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GramCharlier {
    /// Activation flags for the even Hermite terms `C_0`, `C_2`, `C_4`, ...
    pub hermite: Vec<bool>,
    /// How the FSE coefficient is treated
    pub fse: FseMode,
    /// Optional starting value for the FSE coefficient
    pub fse_seed: Option<f64>,
}

impl GramCharlier {
    /// Names of the active Hermite coefficients, without prefix
    ///
    /// ```rust
    /// # use ncstools_profiles::{GramCharlier, FseMode};
    /// let gc = GramCharlier {
    ///     hermite: vec![true, false, true],
    ///     fse: FseMode::Free,
    ///     fse_seed: None,
    /// };
    /// assert_eq!(gc.active_terms(), vec!["C_0", "C_4"]);
    /// ```
    pub fn active_terms(&self) -> Vec<String> {
        self.hermite
            .iter()
            .enumerate()
            .filter(|(_, active)| **active)
            .map(|(k, _)| hermite_name(k))
            .collect()
    }
}

/// Name of the k-th even Hermite coefficient, i.e. `C_{2k}`
pub fn hermite_name(k: usize) -> String {
    f!("C_{}", 2 * k)
}

/// Line-shape approximating the momentum distribution of a mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Profile {
    /// Gaussian momentum distribution
    Gaussian {
        /// Optional starting intensity used for simulations
        intensity_seed: Option<f64>,
    },
    /// Gram-Charlier expansion in even Hermite polynomials
    GramCharlier(GramCharlier),
}

/// Recognised profile function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Gaussian,
    GramCharlier,
}

impl ProfileKind {
    /// Registered function name used in the composite function string
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Gaussian => "GaussianComptonProfile",
            Self::GramCharlier => "GramCharlierComptonProfile",
        }
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Gaussian" => Ok(Self::Gaussian),
            "GramCharlier" => Ok(Self::GramCharlier),
            other => Err(Error::UnknownProfile(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Gaussian => write!(f, "Gaussian"),
            Self::GramCharlier => write!(f, "GramCharlier"),
        }
    }
}

/// A single atomic mass and the model for its Compton profile
///
/// Components are immutable once constructed. The position of a component in
/// a fit defines its parameter prefix (`f0.`, `f1.`, ...).
///
/// ```rust
/// # use ncstools_profiles::{MassComponent, WidthSpec, FseMode, SearsFlag};
/// // Hydrogen with a Gram-Charlier expansion and a tied FSE coefficient
/// let hydrogen = MassComponent::gram_charlier(
///     1.0079,
///     WidthSpec::from_values(&[2.0, 5.0, 7.0]).unwrap(),
///     vec![true, false, false],
///     FseMode::Fixed(SearsFlag::On),
/// )
/// .unwrap();
///
/// // Oxygen with a fixed width Gaussian
/// let oxygen = MassComponent::gaussian(16.0, WidthSpec::Fixed(10.0)).unwrap();
///
/// assert_eq!(
///     oxygen.render("f1.", 0, None).unwrap(),
///     "name=GaussianComptonProfile,WorkspaceIndex=0,Mass=16.000000,Width=10.000000"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassComponent {
    mass: f64,
    width: WidthSpec,
    profile: Profile,
}

impl MassComponent {
    /// Create a component, checking the mass is physical
    pub fn new(mass: f64, width: WidthSpec, profile: Profile) -> Result<Self> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(Error::InvalidMass(mass));
        }

        if let Profile::GramCharlier(gc) = &profile {
            if gc.hermite.is_empty() {
                return Err(Error::EmptyHermiteFlags);
            }
        }

        Ok(Self {
            mass,
            width,
            profile,
        })
    }

    /// Convenience constructor for a Gaussian profile
    pub fn gaussian(mass: f64, width: WidthSpec) -> Result<Self> {
        Self::new(
            mass,
            width,
            Profile::Gaussian {
                intensity_seed: None,
            },
        )
    }

    /// Convenience constructor for a Gram-Charlier profile
    pub fn gram_charlier(
        mass: f64,
        width: WidthSpec,
        hermite: Vec<bool>,
        fse: FseMode,
    ) -> Result<Self> {
        Self::new(
            mass,
            width,
            Profile::GramCharlier(GramCharlier {
                hermite,
                fse,
                fse_seed: None,
            }),
        )
    }

    /// Atomic mass (amu)
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Width specification
    pub fn width(&self) -> &WidthSpec {
        &self.width
    }

    /// Profile model
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Profile function type
    pub fn kind(&self) -> ProfileKind {
        match self.profile {
            Profile::Gaussian { .. } => ProfileKind::Gaussian,
            Profile::GramCharlier(_) => ProfileKind::GramCharlier,
        }
    }

    /// Gram-Charlier settings, if this is a Gram-Charlier profile
    pub fn gram_charlier_settings(&self) -> Option<&GramCharlier> {
        match &self.profile {
            Profile::GramCharlier(gc) => Some(gc),
            Profile::Gaussian { .. } => None,
        }
    }

    /// Names of every fitted parameter of this component, without prefix
    ///
    /// Inactive Hermite coefficients are not parameters at all.
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = vec!["Width".to_string()];
        match &self.profile {
            Profile::Gaussian { .. } => names.push("Intensity".to_string()),
            Profile::GramCharlier(gc) => {
                names.push("FSECoeff".to_string());
                names.extend(gc.active_terms());
            }
        }
        names
    }

    /// Declared starting values for every parameter, keyed with `prefix`
    ///
    /// These are the values a simulation is evaluated at. Gaussian intensities
    /// default to 1, FSE coefficients to 0, and active Hermite terms to 1.
    pub fn default_parameters(&self, prefix: &str) -> ParameterValues {
        let mut values = ParameterValues::new();
        values.insert(f!("{prefix}Width"), self.width.default_value());
        match &self.profile {
            Profile::Gaussian { intensity_seed } => {
                values.insert(f!("{prefix}Intensity"), intensity_seed.unwrap_or(1.0));
            }
            Profile::GramCharlier(gc) => {
                values.insert(f!("{prefix}FSECoeff"), gc.fse_seed.unwrap_or(0.0));
                for term in gc.active_terms() {
                    values.insert(f!("{prefix}{term}"), 1.0);
                }
            }
        }
        values
    }

    /// Build the function fragment for this component
    ///
    /// Without `values` this is the reduced form: the declared default width
    /// and, for Gram-Charlier, the Hermite flags plus the starting FSE value
    /// when the coefficient is tied.
    ///
    /// With `values` every numeric parameter is taken from the table under
    /// `prefix + name`. Inactive Hermite coefficients are never looked up. A
    /// missing key is an error.
    pub fn fragment(
        &self,
        prefix: &str,
        workspace_index: usize,
        values: Option<&ParameterValues>,
    ) -> Result<Fragment> {
        let kind = self.kind();
        let mut fragment = Fragment::new(kind.function_name());
        fragment.push(
            "WorkspaceIndex",
            AttributeValue::Integer(workspace_index as u64),
        );
        fragment.push("Mass", AttributeValue::Number(self.mass));

        let width = match values {
            Some(values) => values.require(&f!("{prefix}Width"))?,
            None => self.width.default_value(),
        };

        match &self.profile {
            Profile::Gaussian { .. } => {
                fragment.push("Width", AttributeValue::Number(width));
                if let Some(values) = values {
                    let intensity = values.require(&f!("{prefix}Intensity"))?;
                    fragment.push("Intensity", AttributeValue::Number(intensity));
                }
            }
            Profile::GramCharlier(gc) => {
                fragment.push("HermiteCoeffs", AttributeValue::Flags(gc.hermite.clone()));
                fragment.push("Width", AttributeValue::Number(width));
                match values {
                    Some(values) => {
                        let mut names = vec!["FSECoeff".to_string()];
                        names.extend(gc.active_terms());
                        for name in names {
                            let value = values.require(&f!("{prefix}{name}"))?;
                            fragment.push(&name, AttributeValue::Number(value));
                        }
                    }
                    None => {
                        if let Some(fixed) = gc.fse.fixed_value(width) {
                            let seed = gc.fse_seed.unwrap_or(fixed);
                            fragment.push("FSECoeff", AttributeValue::Number(seed));
                        }
                    }
                }
            }
        }

        Ok(fragment)
    }

    /// Render the function fragment as text
    ///
    /// See [fragment()](MassComponent::fragment) for the two modes.
    pub fn render(
        &self,
        prefix: &str,
        workspace_index: usize,
        values: Option<&ParameterValues>,
    ) -> Result<String> {
        Ok(self.fragment(prefix, workspace_index, values)?.to_string())
    }
}

/// Descriptor form, i.e. `function=Gaussian,width=10`
///
/// The mass value itself is not part of a descriptor and is given separately.
impl std::fmt::Display for MassComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("function={},width={}", self.kind(), self.width);
        match &self.profile {
            Profile::Gaussian { intensity_seed } => {
                if let Some(seed) = intensity_seed {
                    s += &f!(",intensity={seed}");
                }
            }
            Profile::GramCharlier(gc) => {
                s += &f!(
                    ",hermite_coeffs=[{}]",
                    gc.hermite.iter().map(|&flag| u8::from(flag)).join(", ")
                );
                match gc.fse {
                    FseMode::Free => s += ",k_free=1",
                    FseMode::Fixed(flag) => s += &f!(",k_free=0,sears_flag={}", flag as u8),
                }
                if let Some(seed) = gc.fse_seed {
                    s += &f!(",fse_coeff={seed}");
                }
            }
        }
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogen(fse: FseMode) -> MassComponent {
        MassComponent::gram_charlier(
            1.0079,
            WidthSpec::Range {
                min: 2.0,
                default: 5.0,
                max: 7.0,
            },
            vec![true, false, true],
            fse,
        )
        .unwrap()
    }

    #[test]
    fn reduced_gram_charlier_has_flags_and_fixed_fse() {
        let rendered = hydrogen(FseMode::Fixed(SearsFlag::On))
            .render("f0.", 3, None)
            .unwrap();
        assert_eq!(
            rendered,
            "name=GramCharlierComptonProfile,WorkspaceIndex=3,Mass=1.007900,\
             HermiteCoeffs=1 0 1,Width=5.000000,FSECoeff=0.589256"
        );
    }

    #[test]
    fn reduced_gram_charlier_with_free_fse_has_no_coefficients() {
        let rendered = hydrogen(FseMode::Free).render("f0.", 0, None).unwrap();
        assert!(!rendered.contains("FSECoeff"));
        assert!(!rendered.contains("C_"));
    }

    #[test]
    fn all_free_skips_inactive_hermite_terms() {
        let values: ParameterValues = [
            ("f2.Width", 4.5),
            ("f2.FSECoeff", 0.3),
            ("f2.C_0", 0.9),
            ("f2.C_4", 0.01),
        ]
        .into_iter()
        .collect();

        let rendered = hydrogen(FseMode::Free)
            .render("f2.", 0, Some(&values))
            .unwrap();
        assert_eq!(
            rendered,
            "name=GramCharlierComptonProfile,WorkspaceIndex=0,Mass=1.007900,\
             HermiteCoeffs=1 0 1,Width=4.500000,FSECoeff=0.300000,C_0=0.900000,C_4=0.010000"
        );
        assert!(!rendered.contains("C_2"));
    }

    #[test]
    fn all_free_missing_key_is_fatal() {
        let values: ParameterValues = [("f0.Width", 10.0)].into_iter().collect();
        let oxygen = MassComponent::gaussian(16.0, WidthSpec::Fixed(10.0)).unwrap();

        assert_eq!(
            oxygen.render("f0.", 0, Some(&values)),
            Err(Error::MissingParameter("f0.Intensity".to_string()))
        );
    }

    #[test]
    fn non_positive_mass_is_rejected() {
        assert_eq!(
            MassComponent::gaussian(0.0, WidthSpec::Fixed(1.0)),
            Err(Error::InvalidMass(0.0))
        );
    }

    #[test]
    fn default_parameters_cover_every_parameter_name() {
        let component = hydrogen(FseMode::Free);
        let values = component.default_parameters("f1.");
        for name in component.parameter_names() {
            assert!(values.contains(&f!("f1.{name}")), "missing {name}");
        }
        assert_eq!(values.len(), component.parameter_names().len());
    }

    #[test]
    fn descriptor_display() {
        let component = hydrogen(FseMode::Fixed(SearsFlag::Off));
        assert_eq!(
            component.to_string(),
            "function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1, 0, 1],k_free=0,sears_flag=0"
        );
    }
}
