//! Classification of raw parameter rows by component and field
//!
//! Matching order matters, since a missed match silently drops a row:
//! the final-state-effect coefficient is checked before the generic Hermite
//! coefficients, and background coefficients only match on the background
//! function index.

// external crates
use log::trace;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1};
use nom::combinator::{map_res, rest};
use nom::sequence::{delimited, pair};
use nom::IResult;

/// What a parameter row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Final-state-effect coefficient
    Fse,
    /// Hermite coefficient `C_{2k}`, holding `k`
    Hermite(usize),
    /// Gaussian peak area
    Intensity,
    /// Momentum distribution width
    Width,
    /// Background polynomial coefficient of the given power
    Background(u32),
}

/// Split a composite name into the function index and the field name
fn prefixed(i: &str) -> IResult<&str, (usize, &str)> {
    pair(
        delimited(char('f'), map_res(digit1, str::parse::<usize>), char('.')),
        rest,
    )(i)
}

/// Hermite coefficient order, e.g. `C_4` is `4`
fn hermite_order(i: &str) -> IResult<&str, usize> {
    let (i, _) = tag("C_")(i)?;
    map_res(digit1, str::parse::<usize>)(i)
}

/// Background power, e.g. `A2` is `2`
fn background_power(i: &str) -> IResult<&str, u32> {
    let (i, _) = tag("A")(i)?;
    map_res(digit1, str::parse::<u32>)(i)
}

/// Classify a row name given the number of mass components
///
/// Returns the function index and the field, or `None` for anything that is
/// not a recognised parameter, such as the cost function value.
///
/// ```rust
/// # use ncstools_results::{classify, Field};
/// assert_eq!(classify("f0.FSECoeff", 2), Some((0, Field::Fse)));
/// assert_eq!(classify("f0.C_4", 2), Some((0, Field::Hermite(2))));
/// assert_eq!(classify("f1.Width", 2), Some((1, Field::Width)));
/// assert_eq!(classify("f2.A1", 2), Some((2, Field::Background(1))));
/// assert_eq!(classify("Cost function value", 2), None);
/// ```
pub fn classify(name: &str, n_components: usize) -> Option<(usize, Field)> {
    let Ok((_, (index, field))) = prefixed(name) else {
        trace!("Skipping unprefixed row \"{name}\"");
        return None;
    };

    let field = if field.contains("FSE") {
        Some(Field::Fse)
    } else if let Ok(("", order)) = hermite_order(field) {
        // only even orders exist
        (order % 2 == 0).then_some(Field::Hermite(order / 2))
    } else if field == "Intensity" {
        Some(Field::Intensity)
    } else if field == "Width" {
        Some(Field::Width)
    } else if index == n_components {
        match background_power(field) {
            Ok(("", power)) => Some(Field::Background(power)),
            _ => None,
        }
    } else {
        None
    };

    if field.is_none() {
        trace!("Skipping unclassified row \"{name}\"");
    }

    field.map(|field| (index, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fse_is_not_a_hermite_term() {
        assert_eq!(classify("f3.FSECoeff", 4), Some((3, Field::Fse)));
    }

    #[test]
    fn background_needs_the_background_index() {
        assert_eq!(classify("f1.A0", 2), None);
        assert_eq!(classify("f2.A0", 2), Some((2, Field::Background(0))));
    }

    #[test]
    fn malformed_names() {
        for name in ["f.Width", "g0.Width", "f0Width", "f0.C_x", "f0.C_3", "f0.Height"] {
            assert_eq!(classify(name, 1), None, "{name}");
        }
    }
}
