use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Row-major dense matrix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_columns: usize,
    values: Vec<f64>,
}

impl DenseMatrix {
    #[must_use]
    pub fn zeros(n_rows: usize, n_columns: usize) -> Self {
        Self {
            n_rows,
            n_columns,
            values: vec![0.0; n_rows * n_columns],
        }
    }

    /// Draws every element independently and uniformly from `[0, 1)`.
    #[must_use]
    pub fn random(n_rows: usize, n_columns: usize, rng: &mut impl Rng) -> Self {
        let values = (0..n_rows * n_columns).map(|_| rng.gen::<f64>()).collect();
        Self {
            n_rows,
            n_columns,
            values,
        }
    }

    #[cfg(test)]
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_columns = rows.first().map_or(0, Vec::len);
        ensure!(
            rows.iter().all(|row| row.len() == n_columns),
            "rows have different lengths",
        );
        Ok(Self {
            n_rows,
            n_columns,
            values: rows.into_iter().flatten().collect(),
        })
    }

    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub const fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub const fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_columns)
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.n_columns..(row + 1) * self.n_columns]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.values[row * self.n_columns..(row + 1) * self.n_columns]
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.row(row)[column]
    }

    #[cfg(test)]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Checks that the storage agrees with the declared shape,
    /// which is not guaranteed for deserialized matrices.
    pub fn validate(&self) -> Result {
        ensure!(
            self.values.len() == self.n_rows * self.n_columns,
            "expected {}×{} values, got {}",
            self.n_rows,
            self.n_columns,
            self.values.len(),
        );
        ensure!(
            self.values.iter().all(|value| value.is_finite()),
            "matrix contains non-finite values",
        );
        Ok(())
    }

    /// Subtracts the scaled subtrahend inplace.
    /// Rows are updated in parallel: each cell depends only on itself and its own delta.
    pub fn subtract_scaled(&mut self, subtrahend: &Self, scaling: f64) {
        assert_eq!(self.shape(), subtrahend.shape());
        let n_columns = self.n_columns;
        if n_columns == 0 {
            return;
        }
        self.values
            .par_chunks_mut(n_columns)
            .zip(subtrahend.values.par_chunks(n_columns))
            .for_each(|(minuend, subtrahend)| {
                for (minuend, subtrahend) in minuend.iter_mut().zip(subtrahend) {
                    *minuend -= scaling * subtrahend;
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn random_is_within_unit_interval_ok() {
        let matrix = DenseMatrix::random(17, 5, &mut StdRng::seed_from_u64(42));
        assert_eq!(matrix.values().len(), 85);
        assert!(matrix.values().iter().all(|value| (0.0..1.0).contains(value)));
    }

    #[test]
    fn random_is_reproducible_ok() {
        let matrix_1 = DenseMatrix::random(4, 3, &mut StdRng::seed_from_u64(7));
        let matrix_2 = DenseMatrix::random(4, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(matrix_1, matrix_2);
    }

    #[test]
    fn rows_ok() -> Result {
        let mut matrix = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
        assert_eq!(matrix.row(1), [3.0, 4.0]);
        matrix.row_mut(0)[1] = 5.0;
        assert_eq!(matrix.get(0, 1), 5.0);
        Ok(())
    }

    #[test]
    fn ragged_rows_fail() {
        assert!(DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn subtract_scaled_ok() -> Result {
        let mut matrix = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
        let delta = DenseMatrix::from_rows(vec![vec![10.0, 0.0], vec![-10.0, 20.0]])?;
        matrix.subtract_scaled(&delta, 0.1);
        assert_eq!(matrix.values(), [0.0, 2.0, 4.0, 2.0]);
        Ok(())
    }

    #[test]
    fn validate_ok() -> Result {
        DenseMatrix::zeros(3, 2).validate()?;
        let broken: DenseMatrix =
            serde_json::from_str(r#"{"n_rows": 2, "n_columns": 2, "values": [1.0]}"#)?;
        assert!(broken.validate().is_err());
        Ok(())
    }
}
