//! Declarative descriptor strings for mass profiles and background
//!
//! Profiles are a `;` separated list of `key=value` descriptors, one per mass:
//!
//! ```text
//! function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1, 0, 0],k_free=0,sears_flag=1;
//! function=Gaussian,width=10
//! ```

// crate modules
use crate::background::{Background, DEFAULT_BACKGROUND};
use crate::component::{
    FseMode, GramCharlier, MassComponent, Profile, ProfileKind, SearsFlag, WidthSpec,
};
use crate::error::{Error, Result};
use crate::intensity::IntensityConstraints;
use crate::parsers::{self, Pairs, Value};

// ncstools modules
use ncstools_utils::f;

// external crates
use log::{trace, warn};

/// Parse one descriptor per mass into components
///
/// The descriptors are paired with `masses` in order, so the counts must
/// match. A trailing `;` is allowed.
///
/// ```rust
/// # use ncstools_profiles::{parse_profiles, ProfileKind, WidthSpec};
/// let components = parse_profiles(
///     &[1.0079, 16.0],
///     "function=GramCharlier,width=[2, 5, 7],hermite_coeffs=[1,0,0],k_free=0,sears_flag=1;\
///      function=Gaussian,width=10",
/// )
/// .unwrap();
///
/// assert_eq!(components[0].kind(), ProfileKind::GramCharlier);
/// assert_eq!(components[1].width(), &WidthSpec::Fixed(10.0));
/// ```
pub fn parse_profiles(masses: &[f64], profiles: &str) -> Result<Vec<MassComponent>> {
    if masses.is_empty() {
        return Err(Error::EmptyMasses);
    }

    if profiles.trim().is_empty() {
        return Err(Error::EmptyProfiles);
    }

    let (_, descriptors) = parsers::descriptors(profiles)?;

    if descriptors.len() != masses.len() {
        return Err(Error::CountMismatch {
            masses: masses.len(),
            profiles: descriptors.len(),
        });
    }

    masses
        .iter()
        .zip(descriptors.iter())
        .enumerate()
        .map(|(index, (&mass, pairs))| component(index + 1, mass, pairs, profiles))
        .collect()
}

/// Parse a background descriptor, e.g. `function=Polynomial,order=2`
///
/// An empty string means no background. The function defaults to
/// `Polynomial` when not given.
///
/// ```rust
/// # use ncstools_profiles::parse_background;
/// let background = parse_background("function=Polynomial,order=3").unwrap().unwrap();
/// assert_eq!(background.order(), 3);
///
/// assert!(parse_background("").unwrap().is_none());
/// assert!(parse_background("function=Polynomial,order=1.5").is_err());
/// ```
pub fn parse_background(background: &str) -> Result<Option<Background>> {
    if background.trim().is_empty() {
        return Ok(None);
    }

    let (_, descriptors) = parsers::descriptors(background)?;
    let Some(pairs) = descriptors.first() else {
        return Ok(None);
    };

    let function = match lookup(pairs, "function") {
        Some(value) => scalar("function", value)?,
        None => DEFAULT_BACKGROUND,
    };

    let order = lookup(pairs, "order").ok_or_else(|| Error::MissingKey {
        key: "order".to_string(),
        descriptor: background.to_string(),
    })?;
    let order = scalar("order", order)?;
    let (_, order) = parsers::whole_i64(order)
        .map_err(|_| Error::InvalidBackgroundOrder(order.to_string()))?;

    warn_unknown(pairs, &["function", "order"]);
    Ok(Some(Background::new(function, order)?))
}

/// Parse intensity constraints, e.g. `[0, 1, 0, -4];[1, -1, 0, 0]`
///
/// An empty string means no constraints.
///
/// ```rust
/// # use ncstools_profiles::parse_intensity_constraints;
/// let constraints = parse_intensity_constraints("[0, 1, 0, -4]").unwrap().unwrap();
/// assert_eq!((constraints.nrows(), constraints.ncols()), (1, 4));
///
/// assert!(parse_intensity_constraints("").unwrap().is_none());
/// ```
pub fn parse_intensity_constraints(constraints: &str) -> Result<Option<IntensityConstraints>> {
    if constraints.trim().is_empty() {
        return Ok(None);
    }

    let (_, lists) = parsers::lists(constraints)?;
    let rows = lists
        .iter()
        .map(|list| numbers("intensity_constraints", list))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    IntensityConstraints::from_rows(&rows)
}

/// Build a single component from its descriptor pairs
fn component(index: usize, mass: f64, pairs: &Pairs, source: &str) -> Result<MassComponent> {
    let kind = match lookup(pairs, "function") {
        Some(value) => scalar("function", value)?.parse::<ProfileKind>()?,
        None => {
            return Err(Error::MissingKey {
                key: "function".to_string(),
                descriptor: source.to_string(),
            })
        }
    };

    let width = match lookup(pairs, "width") {
        Some(Value::List(items)) => WidthSpec::from_values(&numbers("width", items)?)?,
        Some(Value::Scalar(value)) => WidthSpec::Fixed(number("width", value)?),
        None => {
            return Err(Error::MissingKey {
                key: "width".to_string(),
                descriptor: source.to_string(),
            })
        }
    };

    let profile = match kind {
        ProfileKind::Gaussian => {
            warn_unknown(pairs, &["function", "width", "intensity"]);
            Profile::Gaussian {
                intensity_seed: optional_number(pairs, "intensity")?,
            }
        }
        ProfileKind::GramCharlier => {
            warn_unknown(
                pairs,
                &["function", "width", "hermite_coeffs", "k_free", "sears_flag", "fse_coeff"],
            );
            Profile::GramCharlier(gram_charlier(index, pairs)?)
        }
    };

    trace!("Mass {index} ({mass}) parsed as {kind}");
    MassComponent::new(mass, width, profile)
}

/// Gram-Charlier flags, all of which are required
fn gram_charlier(index: usize, pairs: &Pairs) -> Result<GramCharlier> {
    let missing = |flag: &str| Error::MissingFlag {
        mass: index,
        flag: flag.to_string(),
    };

    let hermite = match lookup(pairs, "hermite_coeffs").ok_or_else(|| missing("hermite_coeffs"))? {
        Value::List(items) => items
            .iter()
            .map(|item| flag("hermite_coeffs", item))
            .collect::<Result<Vec<bool>>>()?,
        Value::Scalar(value) => vec![flag("hermite_coeffs", value)?],
    };

    let k_free = lookup(pairs, "k_free").ok_or_else(|| missing("k_free"))?;
    let fse = if flag("k_free", scalar("k_free", k_free)?)? {
        FseMode::Free
    } else {
        let sears = lookup(pairs, "sears_flag").ok_or_else(|| missing("sears_flag"))?;
        let sears = flag("sears_flag", scalar("sears_flag", sears)?)?;
        FseMode::Fixed(SearsFlag::try_from(u8::from(sears))?)
    };

    Ok(GramCharlier {
        hermite,
        fse,
        fse_seed: optional_number(pairs, "fse_coeff")?,
    })
}

/// First value for a key, if any
fn lookup<'a>(pairs: &'a Pairs, key: &str) -> Option<&'a Value<'a>> {
    pairs.iter().find(|(k, _)| *k == key).map(|(_, value)| value)
}

/// Unwrap a scalar value, rejecting lists
fn scalar<'a>(key: &str, value: &Value<'a>) -> Result<&'a str> {
    match value {
        Value::Scalar(s) => Ok(*s),
        Value::List(items) => Err(Error::InvalidNumber {
            key: key.to_string(),
            value: f!("[{}]", items.join(", ")),
        }),
    }
}

fn number(key: &str, value: &str) -> Result<f64> {
    parsers::whole_f64(value)
        .map(|(_, v)| v)
        .map_err(|_| Error::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn numbers(key: &str, items: &[&str]) -> Result<Vec<f64>> {
    items.iter().map(|item| number(key, item)).collect()
}

fn optional_number(pairs: &Pairs, key: &str) -> Result<Option<f64>> {
    lookup(pairs, key)
        .map(|value| number(key, scalar(key, value)?))
        .transpose()
}

/// Boolean flag written as 0/1 or true/false
fn flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(Error::InvalidFlag {
            flag: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Unknown keys are ignored, but worth knowing about
fn warn_unknown(pairs: &Pairs, known: &[&str]) {
    for (key, _) in pairs {
        if !known.contains(key) {
            warn!("Ignoring unrecognised descriptor key \"{key}\"");
        }
    }
}
