use crate::math::logistic;
use crate::math::vector::dot;
use crate::prelude::*;
use crate::trainer::factors::FactorStore;
use crate::trainer::hyperparameters::ScoreRange;

/// Base rating prediction over the current factors, before the logistic squash.
pub trait BasePredictor: Sync {
    fn predict(&self, factors: &FactorStore, user: usize, item: usize) -> f64;
}

/// Plain dot product of the user and item factors.
#[derive(Debug, Default, Copy, Clone)]
pub struct DotProduct;

impl BasePredictor for DotProduct {
    #[inline]
    fn predict(&self, factors: &FactorStore, user: usize, item: usize) -> f64 {
        dot(factors.users.row(user), factors.items.row(item))
    }
}

impl<F: Fn(&FactorStore, usize, usize) -> f64 + Sync> BasePredictor for F {
    #[inline]
    fn predict(&self, factors: &FactorStore, user: usize, item: usize) -> f64 {
        self(factors, user, item)
    }
}

pub const USER_DIMENSION: usize = 0;
pub const ITEM_DIMENSION: usize = 1;

/// External evaluation entry point.
pub trait RatingPredictor {
    /// Discrete features carry the user and item indices at fixed positions.
    fn predict_features(&self, discrete_features: &[usize], continuous_features: &[f64]) -> Result<f64>;
}

pub struct Predictor<'a, P = DotProduct> {
    factors: &'a FactorStore,
    base_predictor: P,
    score_range: ScoreRange,
}

impl<'a> Predictor<'a> {
    pub fn new(factors: &'a FactorStore, score_range: ScoreRange) -> Self {
        Self::with_base_predictor(factors, score_range, DotProduct)
    }
}

impl<'a, P: BasePredictor> Predictor<'a, P> {
    pub fn with_base_predictor(factors: &'a FactorStore, score_range: ScoreRange, base_predictor: P) -> Self {
        Self {
            factors,
            base_predictor,
            score_range,
        }
    }

    /// Always within the score range since the logistic function stays within `(0, 1)`.
    #[must_use]
    pub fn predict(&self, user: usize, item: usize) -> f64 {
        let prediction = self.base_predictor.predict(self.factors, user, item);
        self.score_range
            .denormalize(logistic(prediction))
            .clamp(self.score_range.minimum, self.score_range.maximum)
    }
}

impl<'a, P: BasePredictor> RatingPredictor for Predictor<'a, P> {
    fn predict_features(&self, discrete_features: &[usize], _continuous_features: &[f64]) -> Result<f64> {
        let user = *discrete_features
            .get(USER_DIMENSION)
            .ok_or_else(|| anyhow!("user dimension #{} is missing", USER_DIMENSION))?;
        let item = *discrete_features
            .get(ITEM_DIMENSION)
            .ok_or_else(|| anyhow!("item dimension #{} is missing", ITEM_DIMENSION))?;
        ensure!(user < self.factors.n_users(), "user #{} is unknown", user);
        ensure!(item < self.factors.n_items(), "item #{} is unknown", item);
        Ok(self.predict(user, item))
    }
}
