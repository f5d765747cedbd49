//! Full-batch gradient descent over the epochs.

use crate::prelude::*;
use crate::trainer::factors::FactorStore;
use crate::trainer::gradient::GradientEngine;
use crate::trainer::learning_rate::LearningRate;
use crate::trainer::predictor::BasePredictor;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Initialized,
    Training { epoch: usize },
    Converged { epoch: usize },
    EpochExhausted,
}

#[derive(Debug, Copy, Clone)]
pub struct EpochSummary {
    pub epoch: usize,
    pub loss: f64,

    /// Learning rate used for this epoch's update.
    pub learn_rate: f64,

    pub elapsed: StdDuration,
}

#[must_use]
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub state: State,

    /// Loss of every completed epoch, in order.
    pub losses: Vec<f64>,
}

impl TrainingReport {
    pub fn n_epochs(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

pub struct Optimizer<'a, P> {
    engine: GradientEngine<'a, P>,
    learning_rate: LearningRate,
    state: State,
    previous_loss: Option<f64>,
}

impl<'a, P: BasePredictor> Optimizer<'a, P> {
    pub fn new(engine: GradientEngine<'a, P>) -> Self {
        let learning_rate = LearningRate::new(&engine.hyperparameters);
        Self {
            engine,
            learning_rate,
            state: State::Initialized,
            previous_loss: None,
        }
    }

    /// Runs the epochs until convergence or exhaustion.
    ///
    /// The factors are only written between the epochs.
    #[instrument(level = "info", skip_all, fields(n_epochs = self.engine.hyperparameters.n_epochs))]
    pub fn run(
        &mut self,
        factors: &mut FactorStore,
        mut on_epoch: impl FnMut(&EpochSummary),
    ) -> Result<TrainingReport> {
        ensure!(self.state == State::Initialized, "optimizer has already been run");
        let hyperparameters = self.engine.hyperparameters;
        let mut losses = Vec::new();

        for epoch in 1..=hyperparameters.n_epochs {
            self.state = State::Training { epoch };
            let start_instant = Instant::now();

            let context = self.engine.compute(factors);
            let learn_rate = self.learning_rate.current();
            factors.users.subtract_scaled(&context.user_deltas, learn_rate);
            factors.items.subtract_scaled(&context.item_deltas, learn_rate);
            factors.social.subtract_scaled(&context.social_deltas, learn_rate);

            let loss = 0.5 * context.loss;
            ensure!(
                loss.is_finite(),
                "loss is {} at epoch #{}, the settings do not fit the data",
                loss,
                epoch,
            );
            losses.push(loss);

            let summary = EpochSummary {
                epoch,
                loss,
                learn_rate,
                elapsed: start_instant.elapsed(),
            };
            debug!(
                epoch,
                loss,
                delta = self.previous_loss.map(|previous_loss| previous_loss - loss),
                learn_rate,
            );
            on_epoch(&summary);

            if hyperparameters.converge && self.is_converged(loss) {
                self.state = State::Converged { epoch };
                info!(epoch, loss, "converged");
                return Ok(TrainingReport {
                    state: self.state,
                    losses,
                });
            }

            self.learning_rate.adapt(epoch, self.previous_loss, loss);
            self.previous_loss = Some(loss);
        }

        self.state = State::EpochExhausted;
        Ok(TrainingReport {
            state: self.state,
            losses,
        })
    }

    fn is_converged(&self, loss: f64) -> bool {
        self.previous_loss.map_or(false, |previous_loss| {
            (previous_loss - loss).abs() < self.engine.hyperparameters.convergence_threshold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::degrees::DegreeIndex;
    use crate::trainer::dense_matrix::DenseMatrix;
    use crate::trainer::hyperparameters::{Hyperparameters, ScoreRange};
    use crate::trainer::predictor::DotProduct;
    use crate::trainer::sparse_matrix::SparseMatrix;

    fn factors() -> Result<FactorStore> {
        FactorStore::from_matrices(
            DenseMatrix::from_rows(vec![vec![0.1, 0.2], vec![0.3, 0.4]])?,
            DenseMatrix::from_rows(vec![vec![0.5, 0.6], vec![0.7, 0.8]])?,
            DenseMatrix::from_rows(vec![vec![0.2, 0.1], vec![0.4, 0.3]])?,
        )
    }

    fn matrices() -> Result<(SparseMatrix, SparseMatrix)> {
        let ratings = SparseMatrix::from_triples(2, 2, [(0, 0, 5.0), (1, 0, 3.0), (1, 1, 4.0)])?;
        let trust = SparseMatrix::from_triples(2, 2, [(0, 1, 1.0)])?;
        Ok((ratings, trust))
    }

    fn engine<'a>(
        ratings: &'a SparseMatrix,
        trust: &'a SparseMatrix,
        degrees: &'a DegreeIndex,
        hyperparameters: Hyperparameters,
    ) -> Result<GradientEngine<'a, DotProduct>> {
        Ok(GradientEngine {
            ratings,
            trust,
            degrees,
            base_predictor: DotProduct,
            hyperparameters,
            score_range: ScoreRange::new(1.0, 5.0)?,
        })
    }

    #[test]
    fn single_epoch_ok() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 1,
            ..Default::default()
        };
        let mut factors = factors()?;
        let mut optimizer = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?);
        let report = optimizer.run(&mut factors, |_| {})?;

        assert_eq!(report.state, State::EpochExhausted);
        assert_eq!(report.n_epochs(), 1);
        assert!((report.losses[0] - 0.1325130138481954).abs() < 1e-12);

        let expected_users = [[0.10055970641049525, 0.20066283016394798], [0.30002087005683814, 0.4000058006078966]];
        let expected_items = [[0.4999440436368896, 0.6000144434732088], [0.7000143259523195, 0.8000324346030927]];
        let expected_social = [[0.2, 0.1], [0.3999604541825813, 0.29997090836516255]];
        for row in 0..2 {
            for column in 0..2 {
                assert!((factors.users.get(row, column) - expected_users[row][column]).abs() < 1e-12);
                assert!((factors.items.get(row, column) - expected_items[row][column]).abs() < 1e-12);
                assert!((factors.social.get(row, column) - expected_social[row][column]).abs() < 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn second_epoch_ok() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 2,
            ..Default::default()
        };
        let mut factors = factors()?;
        let mut epochs = Vec::new();
        let report = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?)
            .run(&mut factors, |summary| epochs.push(summary.epoch))?;
        assert_eq!(epochs, [1, 2]);
        assert!((report.losses[1] - 0.13243702728981246).abs() < 1e-12);
        assert!(report.losses[1] < report.losses[0]);
        Ok(())
    }

    #[test]
    fn converged_ok() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 100,
            converge: true,
            convergence_threshold: 1e-3,
            ..Default::default()
        };
        let mut factors = factors()?;
        let report = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?).run(&mut factors, |_| {})?;

        // The second epoch's loss is within 1e-3 of the first one.
        assert_eq!(report.state, State::Converged { epoch: 2 });
        assert_eq!(report.n_epochs(), 2);
        Ok(())
    }

    #[test]
    fn unbounded_epochs_converge_ok() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 1 << 60,
            converge: true,
            convergence_threshold: 1e-3,
            ..Default::default()
        };
        let mut factors = factors()?;
        let report = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?).run(&mut factors, |_| {})?;
        assert_eq!(report.state, State::Converged { epoch: 2 });
        Ok(())
    }

    #[test]
    fn convergence_disabled_ok() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 5,
            converge: false,
            convergence_threshold: 1.0,
            ..Default::default()
        };
        let mut factors = factors()?;
        let report = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?).run(&mut factors, |_| {})?;
        assert_eq!(report.state, State::EpochExhausted);
        assert_eq!(report.n_epochs(), 5);
        Ok(())
    }

    #[test]
    fn non_finite_loss_fails() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 10,
            user_regularization: 1e300,
            ..Default::default()
        };
        let mut factors = factors()?;
        let result = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?).run(&mut factors, |_| {});
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn run_twice_fails() -> Result {
        let (ratings, trust) = matrices()?;
        let degrees = DegreeIndex::new(&trust)?;
        let hyperparameters = Hyperparameters {
            n_factors: 2,
            n_epochs: 1,
            ..Default::default()
        };
        let mut factors = factors()?;
        let mut optimizer = Optimizer::new(engine(&ratings, &trust, &degrees, hyperparameters)?);
        optimizer.run(&mut factors, |_| {})?;
        assert!(optimizer.run(&mut factors, |_| {}).is_err());
        Ok(())
    }
}
