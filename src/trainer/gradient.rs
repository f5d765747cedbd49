//! Per-epoch loss and gradient accumulation.

use itertools::izip;

use crate::math::vector::dot;
use crate::math::{logistic, logistic_gradient};
use crate::trainer::degrees::DegreeIndex;
use crate::trainer::dense_matrix::DenseMatrix;
use crate::trainer::factors::FactorStore;
use crate::trainer::hyperparameters::{Hyperparameters, ScoreRange};
use crate::trainer::predictor::BasePredictor;
use crate::trainer::sparse_matrix::SparseMatrix;

/// Loss and deltas of a single epoch. Created zeroed, consumed once, then dropped.
#[must_use]
pub struct EpochContext {
    /// Sum of the squared errors and penalties, not yet halved.
    pub loss: f64,

    pub user_deltas: DenseMatrix,
    pub item_deltas: DenseMatrix,
    pub social_deltas: DenseMatrix,
}

impl EpochContext {
    pub fn new(factors: &FactorStore) -> Self {
        Self {
            loss: 0.0,
            user_deltas: DenseMatrix::zeros(factors.n_users(), factors.n_factors()),
            item_deltas: DenseMatrix::zeros(factors.n_items(), factors.n_factors()),
            social_deltas: DenseMatrix::zeros(factors.n_users(), factors.n_factors()),
        }
    }
}

pub struct GradientEngine<'a, P> {
    pub ratings: &'a SparseMatrix,
    pub trust: &'a SparseMatrix,
    pub degrees: &'a DegreeIndex,
    pub base_predictor: P,
    pub hyperparameters: Hyperparameters,
    pub score_range: ScoreRange,
}

impl<'a, P: BasePredictor> GradientEngine<'a, P> {
    /// Both passes read the same snapshot of the factors.
    pub fn compute(&self, factors: &FactorStore) -> EpochContext {
        let mut context = EpochContext::new(factors);
        self.accumulate_ratings(factors, &mut context);
        self.accumulate_trust(factors, &mut context);
        context
    }

    pub fn accumulate_ratings(&self, factors: &FactorStore, context: &mut EpochContext) {
        let user_regularization = self.hyperparameters.user_regularization;
        let item_regularization = self.hyperparameters.item_regularization;

        for entry in self.ratings.iter() {
            let (user, item) = (entry.row, entry.column);
            let prediction = self.base_predictor.predict(factors, user, item);
            let error = logistic(prediction) - self.score_range.normalize(entry.value);
            let gradient = logistic_gradient(prediction);
            context.loss += error * error;

            for (user_factor, item_factor, user_delta, item_delta) in izip!(
                factors.users.row(user),
                factors.items.row(item),
                context.user_deltas.row_mut(user),
                context.item_deltas.row_mut(item),
            ) {
                *user_delta += gradient * error * item_factor + user_regularization * user_factor;
                *item_delta += gradient * error * user_factor + item_regularization * item_factor;
                context.loss += user_regularization * user_factor * user_factor
                    + item_regularization * item_factor * item_factor;
            }
        }
    }

    pub fn accumulate_trust(&self, factors: &FactorStore, context: &mut EpochContext) {
        let reg_rate = self.hyperparameters.reg_rate;
        let reg_social = self.hyperparameters.reg_social;

        for entry in self.trust.iter().filter(|entry| entry.value != 0.0) {
            let (trustor, trustee) = (entry.row, entry.column);
            let prediction = dot(factors.users.row(trustor), factors.social.row(trustee));
            let weight = self.degrees.confidence_weight(trustor, trustee);
            let error = logistic(prediction) - weight * entry.value;
            let gradient = logistic_gradient(prediction);
            context.loss += reg_rate * error * error;

            for (user_factor, social_factor, user_delta, social_delta) in izip!(
                factors.users.row(trustor),
                factors.social.row(trustee),
                context.user_deltas.row_mut(trustor),
                context.social_deltas.row_mut(trustee),
            ) {
                *user_delta += reg_rate * gradient * error * social_factor;
                *social_delta += reg_rate * gradient * error * user_factor + reg_social * social_factor;
                context.loss += reg_social * social_factor * social_factor;
            }
        }
    }
}
