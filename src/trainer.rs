//! Trains the user, item and social latent factors of the SoRec model.
//! Implements a full-batch gradient descent over the jointly factorized rating and trust matrices.
//!
//! Ma et al., «SoRec: social recommendation using probabilistic matrix factorization», CIKM 2008.

use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

use crate::opts::TrainOpts;
use crate::prelude::*;
use crate::trainer::dataset::Dataset;
use crate::trainer::degrees::DegreeIndex;
use crate::trainer::factors::FactorStore;
use crate::trainer::gradient::GradientEngine;
use crate::trainer::hyperparameters::{Hyperparameters, ScoreRange};
use crate::trainer::model::Model;
use crate::trainer::optimizer::{EpochSummary, Optimizer, TrainingReport};
use crate::trainer::predictor::{BasePredictor, DotProduct};
use crate::trainer::sparse_matrix::SparseMatrix;

pub mod dataset;
pub mod degrees;
pub mod dense_matrix;
pub mod factors;
pub mod gradient;
pub mod hyperparameters;
pub mod learning_rate;
pub mod model;
pub mod optimizer;
pub mod predictor;
pub mod sparse_matrix;

#[instrument(skip_all)]
pub fn run(opts: TrainOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "trainer"));

    let dataset = Dataset::load(&opts.ratings, &opts.trust)?;
    let score_range = ScoreRange::resolve(opts.minimum_score, opts.maximum_score, &dataset.ratings)?;
    let seed = opts.seed.unwrap_or_else(|| thread_rng().gen());
    info!(seed, minimum_score = score_range.minimum, maximum_score = score_range.maximum);

    let (factors, report) = fit(
        &dataset.ratings,
        &dataset.trust,
        opts.hyperparameters,
        score_range,
        DotProduct,
        &mut StdRng::seed_from_u64(seed),
        log_epoch,
    )?;
    info!(
        state = ?report.state,
        n_epochs = report.n_epochs(),
        loss = report.final_loss(),
        "finished",
    );

    if let Some(output) = &opts.output {
        Model {
            hyperparameters: opts.hyperparameters,
            score_range,
            factors,
            users: dataset.users.into_ids(),
            items: dataset.items.into_ids(),
        }
        .save(output)?;
    }
    Ok(())
}

/// Initializes the factors and runs the optimizer on them.
pub fn fit(
    ratings: &SparseMatrix,
    trust: &SparseMatrix,
    hyperparameters: Hyperparameters,
    score_range: ScoreRange,
    base_predictor: impl BasePredictor,
    rng: &mut impl Rng,
    on_epoch: impl FnMut(&EpochSummary),
) -> Result<(FactorStore, TrainingReport)> {
    hyperparameters.validate()?;
    ensure!(!ratings.is_empty(), "there are no ratings");
    ensure!(
        trust.n_rows() == ratings.n_rows(),
        "trust matrix covers {} users, rating matrix covers {}",
        trust.n_rows(),
        ratings.n_rows(),
    );

    let mut factors = FactorStore::random(
        ratings.n_rows(),
        ratings.n_columns(),
        hyperparameters.n_factors,
        rng,
    )?;
    let degrees = DegreeIndex::new(trust)?;
    let engine = GradientEngine {
        ratings,
        trust,
        degrees: &degrees,
        base_predictor,
        hyperparameters,
        score_range,
    };
    let report = Optimizer::new(engine).run(&mut factors, on_epoch)?;
    Ok((factors, report))
}

fn log_epoch(summary: &EpochSummary) {
    info!(
        epoch = summary.epoch,
        loss = summary.loss,
        learn_rate = summary.learn_rate,
        elapsed = %crate::helpers::tracing::format_duration(summary.elapsed),
    );
}
