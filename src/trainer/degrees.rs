//! Trust graph degrees.

use crate::prelude::*;
use crate::trainer::sparse_matrix::SparseMatrix;

/// Per-user in- and out-degrees over the nonzero trust edges.
/// Computed once, the trust graph does not change during training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeIndex {
    in_degrees: Vec<u32>,
    out_degrees: Vec<u32>,
}

impl DegreeIndex {
    #[instrument(level = "debug", skip_all, fields(n_users = trust.n_rows()))]
    pub fn new(trust: &SparseMatrix) -> Result<Self> {
        ensure!(
            trust.n_rows() == trust.n_columns(),
            "trust matrix must be square, got {}×{}",
            trust.n_rows(),
            trust.n_columns(),
        );
        let mut in_degrees = vec![0; trust.n_columns()];
        let mut out_degrees = vec![0; trust.n_rows()];
        for entry in trust.iter().filter(|entry| entry.value != 0.0) {
            out_degrees[entry.row] += 1;
            in_degrees[entry.column] += 1;
        }
        Ok(Self {
            in_degrees,
            out_degrees,
        })
    }

    #[inline]
    pub fn in_degree(&self, user: usize) -> u32 {
        self.in_degrees[user]
    }

    #[inline]
    pub fn out_degree(&self, user: usize) -> u32 {
        self.out_degrees[user]
    }

    /// `sqrt(in(trustee) / (out(trustor) + in(trustee)))`.
    ///
    /// Defined as zero when both degrees are zero.
    #[must_use]
    #[inline]
    pub fn confidence_weight(&self, trustor: usize, trustee: usize) -> f64 {
        let in_degree = f64::from(self.in_degree(trustee));
        let denominator = f64::from(self.out_degree(trustor)) + in_degree;
        if denominator == 0.0 {
            return 0.0;
        }
        (in_degree / denominator).sqrt()
    }
}
