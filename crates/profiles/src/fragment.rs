//! Typed building blocks of the composite function string

// ncstools modules
use ncstools_utils::{f, ValueExt};

// external crates
use itertools::Itertools;

/// Value of a single `key=value` attribute in a function fragment
///
/// The variant decides how the value is written into the function string:
///
/// | Variant   | Example                         |
/// | --------- | ------------------------------- |
/// | `Integer` | `WorkspaceIndex=0`              |
/// | `Number`  | `Width=5.000000`                |
/// | `Flags`   | `HermiteCoeffs=1 0 1`           |
/// | `Text`    | `IntensityConstraints="Matrix(...)"` |
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Plain integer, written as-is
    Integer(u64),
    /// Floating point value, written with six decimal places
    Number(f64),
    /// Space separated list of 1/0 flags
    Flags(Vec<bool>),
    /// Pre-formatted text
    Text(String),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{}", value.fixed()),
            Self::Flags(flags) => write!(
                f,
                "{}",
                flags.iter().map(|&flag| u8::from(flag)).join(" ")
            ),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// One member function of a composite, e.g. a single mass profile
///
/// A [Fragment] is an ordered list of attributes under a function name. It is
/// only turned into text once, at the optimizer boundary.
///
/// ```rust
/// # use ncstools_profiles::{AttributeValue, Fragment};
/// let mut fragment = Fragment::new("GaussianComptonProfile");
/// fragment.push("WorkspaceIndex", AttributeValue::Integer(0));
/// fragment.push("Mass", AttributeValue::Number(16.0));
///
/// assert_eq!(
///     fragment.to_string(),
///     "name=GaussianComptonProfile,WorkspaceIndex=0,Mass=16.000000"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Registered function name
    pub name: String,
    /// Ordered `key=value` attributes
    pub attributes: Vec<(String, AttributeValue)>,
}

impl Fragment {
    /// Start a fragment for the named function with no attributes
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute, keeping insertion order
    pub fn push(&mut self, key: &str, value: AttributeValue) {
        self.attributes.push((key.to_string(), value));
    }

    /// Look up an attribute by key
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }
}

impl std::fmt::Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("name={}", self.name);
        for (key, value) in &self.attributes {
            s += &f!(",{key}={value}");
        }
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_space_separated() {
        let value = AttributeValue::Flags(vec![true, false, true]);
        assert_eq!(value.to_string(), "1 0 1");
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut fragment = Fragment::new("Polynomial");
        fragment.push("n", AttributeValue::Integer(1));
        fragment.push("A1", AttributeValue::Number(0.5));
        fragment.push("A0", AttributeValue::Number(-2.0));

        assert_eq!(
            fragment.to_string(),
            "name=Polynomial,n=1,A1=0.500000,A0=-2.000000"
        );
        assert_eq!(fragment.get("A0"), Some(&AttributeValue::Number(-2.0)));
        assert!(fragment.get("A2").is_none());
    }
}
