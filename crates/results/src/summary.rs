// crate modules
use crate::error::Result;

// ncstools modules
use ncstools_profiles::ProfileKind;
use ncstools_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// A value and its error
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Central value
    pub value: f64,
    /// Symmetric error
    pub error: f64,
}

impl Measurement {
    /// Convenience constructor
    pub fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.6} +/- {:.6}", self.value, self.error)
    }
}

/// Normalised Hermite expansion term of order `2k`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HermiteTerm {
    /// Index of the even term, i.e. `k` for `C_{2k}`
    pub k: usize,
    /// Whether the term was fitted at all
    pub active: bool,
    /// Coefficient normalised to `C_0`
    pub coefficient: Measurement,
    /// Coefficient further divided by `2^(2k) * k!`
    pub reduced: Measurement,
}

/// Physical quantities for one mass component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    /// Position in the fit
    pub index: usize,
    /// Atomic mass (amu)
    pub mass: f64,
    /// Profile function type
    pub kind: ProfileKind,
    /// Standard deviation of the momentum distribution
    pub width: Measurement,
    /// Peak area normalised to the sum over all components
    pub area: Measurement,
    /// Normalised Hermite terms, empty for a Gaussian
    pub hermite: Vec<HermiteTerm>,
    /// Final-state-effect coefficient, Gram-Charlier only
    pub fse: Option<Measurement>,
}

/// Fitted polynomial background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSummary {
    /// Polynomial order
    pub order: u32,
    /// Coefficients from the constant term upwards
    pub coefficients: Vec<Measurement>,
}

/// Zero denominators replaced by 1 during normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degeneracy {
    /// The zeroth Hermite coefficient of a component was exactly zero
    ZeroC0 { component: usize },
    /// The peak areas summed to exactly zero
    ZeroTotalArea,
}

impl std::fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ZeroC0 { component } => write!(
                f,
                "C_0 of mass {} is zero, coefficients were not normalised",
                component + 1
            ),
            Self::ZeroTotalArea => write!(f, "peak areas sum to zero, areas were not normalised"),
        }
    }
}

/// Normalised physical interpretation of a fit
///
/// Derived fresh from the raw parameter table every time, never stored on
/// its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSummary {
    /// Reduced chi-square of the fit
    pub reduced_chi_square: f64,
    /// Per component quantities in fit order
    pub components: Vec<ComponentSummary>,
    /// Background, if one was fitted
    pub background: Option<BackgroundSummary>,
    /// Any zero denominators that were substituted
    pub degeneracies: Vec<Degeneracy>,
}

impl PhysicalSummary {
    /// True if any normalisation had to substitute a zero denominator
    pub fn is_degenerate(&self) -> bool {
        !self.degeneracies.is_empty()
    }

    /// Serialise to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Full text report, one block per mass then the background
impl std::fmt::Display for PhysicalSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let rule = "-".repeat(80);
        let mut s = f!("Reduced Chi-Square = {:.6}\n\n", self.reduced_chi_square);
        s += "Fitting in the TOF space\n";

        for c in &self.components {
            s += &f!("{rule}\n");
            s += &f!("The mass M({})={:.6}\n\n", c.index + 1, c.mass);
            s += "Parameters values in the Y space:\n\n";
            s += &f!("St. dev. of momentum distr. = {}\n", c.width);
            s += &f!("Scatt. int. (area, normalised) = {}\n", c.area);

            if c.kind == ProfileKind::GramCharlier {
                for term in &c.hermite {
                    s += &f!(
                        "Hermite polynomial expansion coefficient c{} = {}\n",
                        2 * term.k,
                        term.coefficient
                    );
                }
                for term in &c.hermite {
                    let n = 2 * term.k;
                    s += &f!(
                        "Hermite polynomial expansion coefficient a{n} = c{n}/(2^{n}*{}!) = {}\n",
                        term.k,
                        term.reduced
                    );
                }
                if let Some(fse) = &c.fse {
                    s += &f!(
                        "\nFSE coefficient k by the k/q He_3(y) expansion member = {fse}\n\n"
                    );
                }
                s += &f!(
                    "The coefficient k calculated in a harmonic oscillator model would be \
                     k = sigma*sqrt(2)/12 = {:.6}\n\n",
                    c.width.value * ncstools_profiles::SEARS_FACTOR
                );
            }
        }

        if let Some(background) = &self.background {
            s += &f!("{rule}\n");
            s += &f!(
                "Background was fitted with the polynomial of degree {}:\n",
                background.order
            );
            for (power, coefficient) in background.coefficients.iter().enumerate().rev() {
                s += &f!("Polynomial coefficient order {power}: {coefficient}\n");
            }
            s += &f!("{rule}\n");
        }

        for degeneracy in &self.degeneracies {
            s += &f!("Warning: {degeneracy}\n");
        }

        write!(f, "{}", s.trim_end())
    }
}
