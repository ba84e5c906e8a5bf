// crate modules
use crate::error::{Error, Result};
use crate::fragment::{AttributeValue, Fragment};
use crate::values::ParameterValues;

// ncstools modules
use ncstools_utils::f;

// external crates
use serde::{Deserialize, Serialize};

/// Default background function name
pub const DEFAULT_BACKGROUND: &str = "Polynomial";

/// Polynomial background added after the mass profiles
///
/// The background is always the last member of the composite, so its
/// coefficients are named `fN.A0 .. fN.A<order>` where `N` is the number of
/// mass components.
///
/// ```rust
/// # use ncstools_profiles::Background;
/// let background = Background::new("Polynomial", 2).unwrap();
/// assert_eq!(background.parameter_names(), vec!["A0", "A1", "A2"]);
/// assert_eq!(background.render(None).unwrap(), "name=Polynomial,n=2");
///
/// // Orders must be non-negative
/// assert!(Background::new("Polynomial", -1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    function: String,
    order: u32,
}

impl Background {
    /// Create a background of the given function and order
    pub fn new(function: &str, order: i64) -> Result<Self> {
        let order = u32::try_from(order)
            .map_err(|_| Error::InvalidBackgroundOrder(order.to_string()))?;
        Ok(Self {
            function: function.to_string(),
            order,
        })
    }

    /// Polynomial background of the given order
    pub fn polynomial(order: u32) -> Self {
        Self {
            function: DEFAULT_BACKGROUND.to_string(),
            order,
        }
    }

    /// Name of the background function
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Polynomial order
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Coefficient names from the constant term upwards, without prefix
    pub fn parameter_names(&self) -> Vec<String> {
        (0..=self.order).map(|power| f!("A{power}")).collect()
    }

    /// Starting values, all zero
    pub fn default_parameters(&self, prefix: &str) -> ParameterValues {
        self.parameter_names()
            .into_iter()
            .map(|name| (f!("{prefix}{name}"), 0.0))
            .collect()
    }

    /// Build the function fragment
    ///
    /// With `values` the coefficients are looked up as `prefix + A<power>`.
    pub fn fragment(&self, prefix: &str, values: Option<&ParameterValues>) -> Result<Fragment> {
        let mut fragment = Fragment::new(&self.function);
        fragment.push("n", AttributeValue::Integer(u64::from(self.order)));
        if let Some(values) = values {
            for name in self.parameter_names() {
                let value = values.require(&f!("{prefix}{name}"))?;
                fragment.push(&name, AttributeValue::Number(value));
            }
        }
        Ok(fragment)
    }

    /// Render the reduced fragment, or the seeded one when given values
    ///
    /// Values are keyed without a component prefix here, see
    /// [fragment()](Background::fragment) for prefixed lookups.
    pub fn render(&self, values: Option<&ParameterValues>) -> Result<String> {
        Ok(self.fragment("", values)?.to_string())
    }
}

/// Descriptor form, i.e. `function=Polynomial,order=2`
impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "function={},order={}", self.function, self.order)
    }
}
