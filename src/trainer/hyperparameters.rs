use clap::Args;
use serde::{Deserialize, Serialize};

use crate::opts::parsers;
use crate::prelude::*;
use crate::trainer::sparse_matrix::SparseMatrix;

#[derive(Args, Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
#[command(next_help_heading = "Hyperparameters")]
pub struct Hyperparameters {
    /// Latent factor count
    #[arg(
        long = "factors",
        default_value_t = 10,
        env = "SOREC_FACTORS",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_factors: usize,

    /// Maximum number of epochs
    #[arg(
        long = "epochs",
        default_value_t = 100,
        env = "SOREC_EPOCHS",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_epochs: usize,

    /// Initial learning rate
    #[arg(
        long = "learn-rate",
        default_value_t = 0.01,
        env = "SOREC_LEARN_RATE",
        value_parser = parsers::positive_f64,
    )]
    pub learn_rate: f64,

    /// Learning rate decay applied after every epoch, used when it is within (0, 1)
    #[arg(
        long,
        default_value_t = 1.0,
        env = "SOREC_LEARN_DECAY",
        value_parser = parsers::non_negative_f64,
    )]
    pub learn_decay: f64,

    /// Learning rate upper limit, zero disables the limit
    #[arg(
        long,
        default_value_t = 0.0,
        env = "SOREC_LEARN_LIMIT",
        value_parser = parsers::non_negative_f64,
    )]
    pub learn_limit: f64,

    /// Adapt the learning rate with the «bold driver» heuristic
    #[arg(long, env = "SOREC_BOLD_DRIVER")]
    pub bold_driver: bool,

    /// User latent factors regularization
    #[arg(
        long,
        default_value_t = 0.01,
        env = "SOREC_USER_REGULARIZATION",
        value_parser = parsers::non_negative_f64,
    )]
    pub user_regularization: f64,

    /// Item latent factors regularization
    #[arg(
        long,
        default_value_t = 0.01,
        env = "SOREC_ITEM_REGULARIZATION",
        value_parser = parsers::non_negative_f64,
    )]
    pub item_regularization: f64,

    /// Weight of the trust prediction loss
    #[arg(
        long,
        default_value_t = 0.01,
        env = "SOREC_REG_RATE",
        value_parser = parsers::non_negative_f64,
    )]
    pub reg_rate: f64,

    /// Social latent factors regularization
    #[arg(
        long,
        default_value_t = 0.01,
        env = "SOREC_REG_SOCIAL",
        value_parser = parsers::non_negative_f64,
    )]
    pub reg_social: f64,

    /// Stop once the absolute loss change drops below the threshold
    #[arg(long, env = "SOREC_CONVERGE")]
    pub converge: bool,

    /// Convergence threshold on the absolute loss change
    #[arg(
        long,
        default_value_t = 1e-5,
        env = "SOREC_CONVERGENCE_THRESHOLD",
        value_parser = parsers::non_negative_f64,
    )]
    pub convergence_threshold: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            n_factors: 10,
            n_epochs: 100,
            learn_rate: 0.01,
            learn_decay: 1.0,
            learn_limit: 0.0,
            bold_driver: false,
            user_regularization: 0.01,
            item_regularization: 0.01,
            reg_rate: 0.01,
            reg_social: 0.01,
            converge: false,
            convergence_threshold: 1e-5,
        }
    }
}

impl Hyperparameters {
    /// Values coming from a model file bypass the CLI parsers, hence the second check.
    pub fn validate(&self) -> Result {
        ensure!(self.n_factors != 0, "number of factors must be positive");
        ensure!(self.n_epochs != 0, "number of epochs must be positive");
        ensure!(
            self.learn_rate.is_finite() && self.learn_rate > 0.0,
            "learning rate must be positive, got {}",
            self.learn_rate,
        );
        for (name, value) in [
            ("learning rate decay", self.learn_decay),
            ("learning rate limit", self.learn_limit),
            ("user regularization", self.user_regularization),
            ("item regularization", self.item_regularization),
            ("trust loss weight", self.reg_rate),
            ("social regularization", self.reg_social),
            ("convergence threshold", self.convergence_threshold),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be non-negative, got {}",
                name,
                value,
            );
        }
        Ok(())
    }
}

/// Rating range used to normalize the observed scores into `[0, 1]`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ScoreRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl ScoreRange {
    pub fn new(minimum: f64, maximum: f64) -> Result<Self> {
        ensure!(
            minimum.is_finite() && maximum.is_finite(),
            "score range must be finite",
        );
        ensure!(
            maximum > minimum,
            "maximum score {} must be greater than minimum score {}",
            maximum,
            minimum,
        );
        Ok(Self { minimum, maximum })
    }

    /// Takes the missing bounds from the observed ratings.
    pub fn resolve(
        minimum: Option<f64>,
        maximum: Option<f64>,
        ratings: &SparseMatrix,
    ) -> Result<Self> {
        let (observed_minimum, observed_maximum) = ratings
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(minimum, maximum), value| {
                (minimum.min(value), maximum.max(value))
            });
        Self::new(minimum.unwrap_or(observed_minimum), maximum.unwrap_or(observed_maximum))
    }

    #[must_use]
    #[inline]
    pub fn width(&self) -> f64 {
        self.maximum - self.minimum
    }

    #[must_use]
    #[inline]
    pub fn normalize(&self, score: f64) -> f64 {
        (score - self.minimum) / self.width()
    }

    #[must_use]
    #[inline]
    pub fn denormalize(&self, value: f64) -> f64 {
        self.minimum + value * self.width()
    }
}
