//! Width constraints and parameter ties derived from mass components

// crate modules
use crate::component::{FseMode, MassComponent, SearsFlag, WidthSpec};

// ncstools modules
use ncstools_utils::{f, ValueExt};

// external crates
use itertools::Itertools;

/// Inequality constraint on a component width, `min < fN.Width < max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// Index of the component in declaration order
    pub component: usize,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} < f{}.Width < {}",
            self.min.fixed(),
            self.component,
            self.max.fixed()
        )
    }
}

/// Equality tie of a parameter to an expression, `name=expression`
#[derive(Debug, Clone, PartialEq)]
pub struct Tie {
    /// Fully prefixed parameter name
    pub parameter: String,
    /// Value or expression the parameter is held at
    pub expression: String,
}

impl std::fmt::Display for Tie {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}={}", self.parameter, self.expression)
    }
}

/// Collect the width constraints for a set of components
///
/// One constraint per component with a ranged width, in declaration order.
/// Fixed widths are tied instead (see [build_ties]).
///
/// ```rust
/// # use ncstools_profiles::{build_constraints, MassComponent, WidthSpec};
/// let components = vec![
///     MassComponent::gaussian(16.0, WidthSpec::Fixed(10.0)).unwrap(),
///     MassComponent::gaussian(27.0, WidthSpec::from_values(&[11.0, 13.0, 15.0]).unwrap()).unwrap(),
/// ];
///
/// let constraints = build_constraints(&components);
/// assert_eq!(constraints.len(), 1);
/// assert_eq!(constraints[0].to_string(), "11.000000 < f1.Width < 15.000000");
/// ```
pub fn build_constraints(components: &[MassComponent]) -> Vec<Constraint> {
    components
        .iter()
        .enumerate()
        .filter_map(|(index, component)| match *component.width() {
            WidthSpec::Range { min, max, .. } => Some(Constraint {
                component: index,
                min,
                max,
            }),
            WidthSpec::Fixed(_) => None,
        })
        .collect()
}

/// Collect the parameter ties for a set of components
///
/// For each component in declaration order:
///
/// 1. A fixed width is tied to its value
/// 2. A Gram-Charlier profile with a fixed FSE coefficient ties `FSECoeff` to
///    `Width*sqrt(2)/12` when the Sears flag is set, and to `0` otherwise
///
/// ```rust
/// # use ncstools_profiles::{build_ties, join, MassComponent, WidthSpec, FseMode, SearsFlag};
/// let hydrogen = MassComponent::gram_charlier(
///     1.0079,
///     WidthSpec::Fixed(5.0),
///     vec![true, false, false],
///     FseMode::Fixed(SearsFlag::On),
/// )
/// .unwrap();
///
/// assert_eq!(
///     join(&build_ties(&[hydrogen])),
///     "f0.Width=5.000000,f0.FSECoeff=f0.Width*sqrt(2)/12"
/// );
/// ```
pub fn build_ties(components: &[MassComponent]) -> Vec<Tie> {
    let mut ties = Vec::new();

    for (index, component) in components.iter().enumerate() {
        let prefix = f!("f{index}.");

        if let WidthSpec::Fixed(width) = component.width() {
            ties.push(Tie {
                parameter: f!("{prefix}Width"),
                expression: width.fixed(),
            });
        }

        if let Some(gc) = component.gram_charlier_settings() {
            let expression = match gc.fse {
                FseMode::Free => continue,
                FseMode::Fixed(SearsFlag::On) => f!("{prefix}Width*sqrt(2)/12"),
                FseMode::Fixed(SearsFlag::Off) => "0".to_string(),
            };
            ties.push(Tie {
                parameter: f!("{prefix}FSECoeff"),
                expression,
            });
        }
    }

    ties
}

/// Comma separated list of constraints or ties
///
/// An empty list is an empty string.
pub fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(mass: f64, width: &[f64]) -> MassComponent {
        MassComponent::gaussian(mass, WidthSpec::from_values(width).unwrap()).unwrap()
    }

    #[test]
    fn empty_lists_render_empty() {
        assert_eq!(join(&build_constraints(&[])), "");
        assert_eq!(join(&build_ties(&[])), "");
    }

    #[test]
    fn constraints_follow_declaration_order() {
        let components = vec![
            gaussian(1.0, &[2.0, 5.0, 7.0]),
            gaussian(16.0, &[10.0]),
            gaussian(27.0, &[11.0, 13.0, 15.0]),
        ];
        assert_eq!(
            join(&build_constraints(&components)),
            "2.000000 < f0.Width < 7.000000,11.000000 < f2.Width < 15.000000"
        );
    }

    #[test]
    fn free_fse_adds_no_tie() {
        let component = MassComponent::gram_charlier(
            1.0079,
            WidthSpec::from_values(&[2.0, 5.0, 7.0]).unwrap(),
            vec![true, true],
            FseMode::Free,
        )
        .unwrap();
        assert!(build_ties(&[component]).is_empty());
    }

    #[test]
    fn zero_sears_flag_ties_to_zero() {
        let components = vec![
            gaussian(16.0, &[10.0]),
            MassComponent::gram_charlier(
                1.0079,
                WidthSpec::from_values(&[2.0, 5.0, 7.0]).unwrap(),
                vec![true],
                FseMode::Fixed(SearsFlag::Off),
            )
            .unwrap(),
        ];
        assert_eq!(
            join(&build_ties(&components)),
            "f0.Width=10.000000,f1.FSECoeff=0"
        );
    }
}
