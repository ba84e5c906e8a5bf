//! Normalisation of the raw parameter table into physical quantities

// crate modules
use crate::classify::{classify, Field};
use crate::error::{Error, Result};
use crate::summary::{
    BackgroundSummary, ComponentSummary, Degeneracy, HermiteTerm, Measurement, PhysicalSummary,
};

// ncstools modules
use ncstools_fitting::{FitResult, FitSpec};
use ncstools_profiles::{hermite_name, FseMode, MassComponent, Profile, SearsFlag, SEARS_FACTOR};
use ncstools_utils::f;

// external crates
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default relative step for the numerical Jacobian
pub const DEFAULT_PERTURBATION: f64 = 0.01;

/// Options for deriving the physical summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    /// Relative step used for the symmetric finite differences
    pub perturbation: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            perturbation: DEFAULT_PERTURBATION,
        }
    }
}

impl TransformOptions {
    /// Check the step is usable
    pub fn validate(&self) -> Result<()> {
        if self.perturbation > 0.0 && self.perturbation.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidPerturbation(self.perturbation))
        }
    }
}

/// Rows of the parameter table belonging to one mass component
#[derive(Debug, Default)]
struct ComponentRows {
    width: Option<Measurement>,
    intensity: Option<Measurement>,
    fse: Option<Measurement>,
    hermite: BTreeMap<usize, Measurement>,
}

impl ComponentRows {
    fn hermite(&self, component: usize, k: usize) -> Result<Measurement> {
        self.hermite.get(&k).copied().ok_or_else(|| Error::MissingRow {
            component,
            field: hermite_name(k),
        })
    }
}

/// Raw rows grouped by component
#[derive(Debug)]
struct GroupedRows {
    components: Vec<ComponentRows>,
    background: BTreeMap<u32, Measurement>,
}

/// Converts a raw [FitResult] into a [PhysicalSummary]
///
/// The raw table is only ever read. The summary is rebuilt from scratch on
/// every call.
#[derive(Debug, Clone)]
pub struct ResultTransformer<'a> {
    spec: &'a FitSpec,
    options: TransformOptions,
}

impl<'a> ResultTransformer<'a> {
    /// Transformer for results of the given model, with default options
    pub fn new(spec: &'a FitSpec) -> Self {
        Self {
            spec,
            options: TransformOptions::default(),
        }
    }

    /// Replace the options
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in use
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Derive the normalised physical quantities from a fit result
    pub fn transform(&self, result: &FitResult) -> Result<PhysicalSummary> {
        self.options.validate()?;

        let components = self.spec.components();
        let rows = self.group(result)?;
        let mut degeneracies = Vec::new();

        // Peak areas are the intensity for a Gaussian and C_0 otherwise
        let areas = components
            .iter()
            .zip(rows.components.iter())
            .enumerate()
            .map(|(i, (component, rows))| raw_area(i, component, rows))
            .collect::<Result<Vec<Measurement>>>()?;

        if areas.iter().map(|a| a.value).sum::<f64>() == 0.0 {
            warn!("Peak areas sum to zero, normalising by 1 instead");
            degeneracies.push(Degeneracy::ZeroTotalArea);
        }
        let areas = normalise_areas(&areas, self.options.perturbation);

        let mut summaries = Vec::with_capacity(components.len());
        for (i, (component, rows)) in components.iter().zip(rows.components.iter()).enumerate() {
            let width = rows.width.ok_or_else(|| Error::MissingRow {
                component: i,
                field: "Width".to_string(),
            })?;

            let (hermite, fse) = match component.profile() {
                Profile::Gaussian { .. } => (Vec::new(), None),
                Profile::GramCharlier(gc) => {
                    let c0 = rows.hermite(i, 0)?;
                    let c0 = if c0.value == 0.0 {
                        warn!("C_0 of mass {} is zero, normalising by 1 instead", i + 1);
                        degeneracies.push(Degeneracy::ZeroC0 { component: i });
                        Measurement::new(1.0, c0.error)
                    } else {
                        c0
                    };

                    let hermite = gc
                        .hermite
                        .iter()
                        .enumerate()
                        .map(|(k, active)| hermite_term(i, k, *active, rows, c0))
                        .collect::<Result<Vec<HermiteTerm>>>()?;

                    let fse = match gc.fse {
                        FseMode::Free => {
                            let k = rows.fse.ok_or_else(|| Error::MissingRow {
                                component: i,
                                field: "FSECoeff".to_string(),
                            })?;
                            ratio(k, c0)
                        }
                        FseMode::Fixed(SearsFlag::On) => {
                            Measurement::new(width.value * SEARS_FACTOR, width.error * SEARS_FACTOR)
                        }
                        FseMode::Fixed(SearsFlag::Off) => Measurement::default(),
                    };
                    (hermite, Some(fse))
                }
            };

            debug!(
                "Mass {} width = {width}, area = {}",
                component.mass(),
                areas[i]
            );

            summaries.push(ComponentSummary {
                index: i,
                mass: component.mass(),
                kind: component.kind(),
                width,
                area: areas[i],
                hermite,
                fse,
            });
        }

        let background = self
            .spec
            .background()
            .map(|background| {
                (0..=background.order())
                    .map(|power| {
                        rows.background.get(&power).copied().ok_or_else(|| Error::MissingRow {
                            component: components.len(),
                            field: f!("A{power}"),
                        })
                    })
                    .collect::<Result<Vec<Measurement>>>()
                    .map(|coefficients| BackgroundSummary {
                        order: background.order(),
                        coefficients,
                    })
            })
            .transpose()?;

        Ok(PhysicalSummary {
            reduced_chi_square: result.reduced_chi_square,
            components: summaries,
            background,
            degeneracies,
        })
    }

    /// Sort every recognised row into its component
    fn group(&self, result: &FitResult) -> Result<GroupedRows> {
        let n = self.spec.components().len();
        let count = n + usize::from(self.spec.background().is_some());

        let mut grouped = GroupedRows {
            components: (0..n).map(|_| ComponentRows::default()).collect(),
            background: BTreeMap::new(),
        };

        for row in &result.parameters {
            let Some((index, field)) = classify(&row.name, n) else {
                continue;
            };

            if index >= count {
                return Err(Error::IndexOutOfRange {
                    name: row.name.clone(),
                    index,
                    count,
                });
            }

            let value = Measurement::new(row.value, row.error);
            match field {
                Field::Background(power) => {
                    grouped.background.insert(power, value);
                }
                // Profile fields on the background function are not physical
                _ if index == n => continue,
                Field::Width => grouped.components[index].width = Some(value),
                Field::Intensity => grouped.components[index].intensity = Some(value),
                Field::Fse => grouped.components[index].fse = Some(value),
                Field::Hermite(k) => {
                    grouped.components[index].hermite.insert(k, value);
                }
            }
        }

        Ok(grouped)
    }
}

/// Unnormalised peak area of a component
fn raw_area(index: usize, component: &MassComponent, rows: &ComponentRows) -> Result<Measurement> {
    match component.profile() {
        Profile::Gaussian { .. } => rows.intensity.ok_or_else(|| Error::MissingRow {
            component: index,
            field: "Intensity".to_string(),
        }),
        Profile::GramCharlier(_) => rows.hermite(index, 0),
    }
}

/// `a / b` with the first order error `|da*b - db*a| / b^2`
fn ratio(a: Measurement, b: Measurement) -> Measurement {
    Measurement::new(
        a.value / b.value,
        (a.error * b.value - b.error * a.value).abs() / b.value.powi(2),
    )
}

/// Normalised Hermite term `C_{2k}/C_0`, and that over `2^(2k) * k!`
fn hermite_term(
    component: usize,
    k: usize,
    active: bool,
    rows: &ComponentRows,
    c0: Measurement,
) -> Result<HermiteTerm> {
    if !active {
        return Ok(HermiteTerm {
            k,
            active,
            coefficient: Measurement::default(),
            reduced: Measurement::default(),
        });
    }

    let coefficient = ratio(rows.hermite(component, k)?, c0);
    let factor = 4f64.powi(k as i32) * (1..=k).map(|i| i as f64).product::<f64>();

    Ok(HermiteTerm {
        k,
        active,
        coefficient,
        reduced: Measurement::new(coefficient.value / factor, coefficient.error / factor),
    })
}

/// Areas over their sum, a zero sum being replaced by 1
fn normalised(areas: &DVector<f64>) -> DVector<f64> {
    let total = areas.sum();
    if total == 0.0 {
        areas.clone()
    } else {
        areas / total
    }
}

/// Normalise the areas and propagate their errors
///
/// The Jacobian is estimated by symmetric finite differences with a step of
/// `perturbation * |A_k|`, or `perturbation` itself for a zero area. Errors
/// are combined in quadrature as `sqrt(sum_k (J_jk * dA_k)^2)`.
pub(crate) fn normalise_areas(areas: &[Measurement], perturbation: f64) -> Vec<Measurement> {
    let n = areas.len();
    let values = DVector::from_iterator(n, areas.iter().map(|a| a.value));
    let errors = DVector::from_iterator(n, areas.iter().map(|a| a.error));

    let mut jacobian = DMatrix::<f64>::zeros(n, n);
    for k in 0..n {
        let step = match values[k] {
            v if v == 0.0 => perturbation,
            v => perturbation * v.abs(),
        };

        let mut plus = values.clone();
        plus[k] += step;
        let mut minus = values.clone();
        minus[k] -= step;

        let column = (normalised(&plus) - normalised(&minus)) / (2.0 * step);
        jacobian.set_column(k, &column);
    }

    let weighted = &jacobian * DMatrix::from_diagonal(&errors);
    normalised(&values)
        .iter()
        .enumerate()
        .map(|(j, value)| Measurement::new(*value, weighted.row(j).norm()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_of_two_equal_areas() {
        let areas = [Measurement::new(1.0, 0.1), Measurement::new(1.0, 0.1)];
        let normalised = normalise_areas(&areas, DEFAULT_PERTURBATION);

        // dN_0/dA_0 = -dN_0/dA_1 = 0.25
        let expected = (2.0 * (0.25f64 * 0.1).powi(2)).sqrt();
        for area in normalised {
            assert_eq!(area.value, 0.5);
            assert!((area.error - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn ratio_error() {
        let r = ratio(Measurement::new(2.0, 0.2), Measurement::new(4.0, 0.1));
        assert_eq!(r.value, 0.5);
        assert!((r.error - (0.8 - 0.2_f64).abs() / 16.0).abs() < 1e-12);
    }

    #[test]
    fn reduced_hermite_factor() {
        let mut rows = ComponentRows::default();
        rows.hermite.insert(2, Measurement::new(0.64, 0.0));
        let term = hermite_term(0, 2, true, &rows, Measurement::new(2.0, 0.0)).unwrap();

        // 0.32 / (2^4 * 2!)
        assert!((term.coefficient.value - 0.32).abs() < 1e-12);
        assert!((term.reduced.value - 0.01).abs() < 1e-12);
    }

    #[test]
    fn zero_perturbation_is_rejected() {
        let options = TransformOptions { perturbation: 0.0 };
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidPerturbation(_))
        ));
    }
}
