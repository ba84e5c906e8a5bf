// crate modules
use crate::error::{Error, Result};

// ncstools modules
use ncstools_utils::{f, ValueExt};

// external crates
use itertools::Itertools;
use nalgebra::DMatrix;

/// Linear constraints between the peak areas of the mass components
///
/// Each row is one constraint and each column corresponds to a mass component
/// in declaration order. For example, `[0, 1, 0, -4]` requires the intensity
/// of the second mass to be four times the intensity of the fourth.
///
/// ```rust
/// # use ncstools_profiles::IntensityConstraints;
/// let constraints = IntensityConstraints::from_rows(&[vec![0.0, 1.0, 0.0, -4.0]])
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(constraints.nrows(), 1);
/// assert_eq!(constraints.ncols(), 4);
/// assert_eq!(
///     constraints.render(),
///     "\"Matrix(1|4)0.000000|1.000000|0.000000|-4.000000\""
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityConstraints {
    matrix: DMatrix<f64>,
}

impl IntensityConstraints {
    /// Build the constraint matrix from rows of coefficients
    ///
    /// Returns `Ok(None)` when there are no rows, or every row is empty, since
    /// no intensity constraint term should be emitted at all.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Option<Self>> {
        let rows = rows
            .iter()
            .filter(|row| !row.is_empty())
            .collect::<Vec<&Vec<f64>>>();

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let ncols = first.len();
        if let Some(ragged) = rows.iter().find(|row| row.len() != ncols) {
            return Err(Error::RaggedConstraints {
                expected: ncols,
                found: ragged.len(),
            });
        }

        let matrix = DMatrix::from_row_iterator(
            rows.len(),
            ncols,
            rows.iter().flat_map(|row| row.iter().copied()),
        );

        Ok(Some(Self { matrix }))
    }

    /// Number of independent constraints
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of mass components constrained
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Coefficient matrix
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Constraint rows as plain vectors
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    /// Quoted, row-major matrix string with explicit dimensions
    pub fn render(&self) -> String {
        let values = self
            .matrix
            .row_iter()
            .flat_map(|row| row.iter().map(|v| v.fixed()).collect::<Vec<String>>())
            .join("|");
        f!("\"Matrix({}|{}){}\"", self.nrows(), self.ncols(), values)
    }
}

/// Descriptor form, i.e. `[0, 1, 0, -4];[1, -1, 0, 0]`
impl std::fmt::Display for IntensityConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self
            .rows()
            .iter()
            .map(|row| f!("[{}]", row.iter().join(", ")))
            .join(";");
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_mean_no_constraint() {
        assert_eq!(IntensityConstraints::from_rows(&[]), Ok(None));
        assert_eq!(IntensityConstraints::from_rows(&[vec![]]), Ok(None));
    }

    #[test]
    fn matrix_is_rendered_row_major() {
        let constraints =
            IntensityConstraints::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
                .unwrap()
                .unwrap();
        assert_eq!(
            constraints.render(),
            "\"Matrix(2|3)1.000000|2.000000|3.000000|4.000000|5.000000|6.000000\""
        );
        assert_eq!(constraints.to_string(), "[1, 2, 3];[4, 5, 6]");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert_eq!(
            IntensityConstraints::from_rows(&[vec![1.0, 2.0], vec![1.0]]),
            Err(Error::RaggedConstraints {
                expected: 2,
                found: 1
            })
        );
    }
}
