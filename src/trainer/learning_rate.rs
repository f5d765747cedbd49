use crate::trainer::hyperparameters::Hyperparameters;

pub struct LearningRate {
    current: f64,
    decay: f64,
    limit: f64,
    bold_driver: bool,
}

impl LearningRate {
    pub const BOLD_DRIVER_GROWTH: f64 = 1.05;
    pub const BOLD_DRIVER_SHRINK: f64 = 0.5;

    pub const fn new(hyperparameters: &Hyperparameters) -> Self {
        Self {
            current: hyperparameters.learn_rate,
            decay: hyperparameters.learn_decay,
            limit: hyperparameters.learn_limit,
            bold_driver: hyperparameters.bold_driver,
        }
    }

    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Adapts the rate after an epoch.
    ///
    /// The «bold driver» grows the rate while the loss falls and halves it otherwise.
    /// Without it, the decay is applied when it is within `(0, 1)`.
    pub fn adapt(&mut self, epoch: usize, previous_loss: Option<f64>, loss: f64) {
        match previous_loss {
            Some(previous_loss) if self.bold_driver && epoch > 1 => {
                self.current *= if previous_loss.abs() > loss.abs() {
                    Self::BOLD_DRIVER_GROWTH
                } else {
                    Self::BOLD_DRIVER_SHRINK
                };
            }
            _ if self.decay > 0.0 && self.decay < 1.0 => {
                self.current *= self.decay;
            }
            _ => {}
        }
        if self.limit > 0.0 && self.current > self.limit {
            self.current = self.limit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_by_default_ok() {
        let mut rate = LearningRate::new(&Hyperparameters::default());
        for epoch in 1..=5 {
            rate.adapt(epoch, Some(1.0), 0.5);
        }
        assert_eq!(rate.current(), 0.01);
    }

    #[test]
    fn decay_ok() {
        let mut rate = LearningRate::new(&Hyperparameters {
            learn_rate: 1.0,
            learn_decay: 0.5,
            ..Default::default()
        });
        rate.adapt(1, None, 1.0);
        rate.adapt(2, Some(1.0), 0.5);
        assert_eq!(rate.current(), 0.25);
    }

    #[test]
    fn bold_driver_ok() {
        let mut rate = LearningRate::new(&Hyperparameters {
            learn_rate: 1.0,
            learn_decay: 0.5,
            bold_driver: true,
            ..Default::default()
        });

        // The first epoch has nothing to compare with and falls back to the decay.
        rate.adapt(1, None, 10.0);
        assert_eq!(rate.current(), 0.5);

        rate.adapt(2, Some(10.0), 5.0);
        assert!((rate.current() - 0.525).abs() < 1e-12);

        rate.adapt(3, Some(5.0), 6.0);
        assert!((rate.current() - 0.2625).abs() < 1e-12);
    }

    #[test]
    fn limit_ok() {
        let mut rate = LearningRate::new(&Hyperparameters {
            learn_rate: 1.0,
            learn_limit: 1.02,
            bold_driver: true,
            ..Default::default()
        });
        rate.adapt(2, Some(2.0), 1.0);
        assert_eq!(rate.current(), 1.02);
    }
}
