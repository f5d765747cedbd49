//! Latent factor matrices.

use std::mem::size_of;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::trainer::dense_matrix::DenseMatrix;

/// User factors embed a user as a rater and trustor,
/// social factors embed a user as a trustee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "FactorMatrices")]
pub struct FactorStore {
    pub users: DenseMatrix,
    pub items: DenseMatrix,
    pub social: DenseMatrix,
}

/// Deserialized matrices, not yet checked against each other.
#[derive(Deserialize)]
struct FactorMatrices {
    users: DenseMatrix,
    items: DenseMatrix,
    social: DenseMatrix,
}

impl TryFrom<FactorMatrices> for FactorStore {
    type Error = anyhow::Error;

    fn try_from(matrices: FactorMatrices) -> Result<Self> {
        Self::from_matrices(matrices.users, matrices.items, matrices.social)
    }
}

impl FactorStore {
    /// Initializes the factors uniformly from `[0, 1)`: users, then items, then social.
    pub fn random(
        n_users: usize,
        n_items: usize,
        n_factors: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        ensure!(n_users != 0, "there must be at least one user");
        ensure!(n_items != 0, "there must be at least one item");
        ensure!(n_factors != 0, "there must be at least one factor");
        for (name, n_rows) in [("user", n_users), ("item", n_items)] {
            ensure!(
                n_rows
                    .checked_mul(n_factors)
                    .and_then(|n_values| n_values.checked_mul(size_of::<f64>()))
                    .map_or(false, |n_bytes| n_bytes <= isize::MAX as usize),
                "{}×{} {} factors do not fit into memory",
                n_rows,
                n_factors,
                name,
            );
        }
        let users = DenseMatrix::random(n_users, n_factors, rng);
        let items = DenseMatrix::random(n_items, n_factors, rng);
        let social = DenseMatrix::random(n_users, n_factors, rng);
        Ok(Self {
            users,
            items,
            social,
        })
    }

    pub fn from_matrices(users: DenseMatrix, items: DenseMatrix, social: DenseMatrix) -> Result<Self> {
        let factors = Self {
            users,
            items,
            social,
        };
        factors.validate()?;
        Ok(factors)
    }

    pub fn validate(&self) -> Result {
        self.users.validate().context("invalid user factors")?;
        self.items.validate().context("invalid item factors")?;
        self.social.validate().context("invalid social factors")?;
        ensure!(self.n_factors() != 0, "there must be at least one factor");
        ensure!(
            self.items.n_columns() == self.n_factors() && self.social.n_columns() == self.n_factors(),
            "factor counts differ",
        );
        ensure!(
            self.social.n_rows() == self.users.n_rows(),
            "user and social factors have {} and {} rows",
            self.users.n_rows(),
            self.social.n_rows(),
        );
        Ok(())
    }

    pub const fn n_users(&self) -> usize {
        self.users.n_rows()
    }

    pub const fn n_items(&self) -> usize {
        self.items.n_rows()
    }

    pub const fn n_factors(&self) -> usize {
        self.users.n_columns()
    }
}
