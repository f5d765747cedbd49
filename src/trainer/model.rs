use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::trainer::dataset::IdMap;
use crate::trainer::factors::FactorStore;
use crate::trainer::hyperparameters::{Hyperparameters, ScoreRange};
use crate::trainer::predictor::Predictor;

/// Trained model as stored on disk.
#[derive(Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub hyperparameters: Hyperparameters,

    pub score_range: ScoreRange,
    pub factors: FactorStore,

    /// Raw user identifiers in the index order.
    pub users: Vec<String>,

    /// Raw item identifiers in the index order.
    pub items: Vec<String>,
}

impl Model {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result {
        let file = File::create(path).with_context(|| format!("failed to create `{}`", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).context("failed to serialize the model")?;
        writer.flush()?;
        info!("saved");
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
        let model: Self =
            serde_json::from_reader(BufReader::new(file)).context("failed to deserialize the model")?;
        model.validate()?;
        info!(n_users = model.users.len(), n_items = model.items.len(), "loaded");
        Ok(model)
    }

    pub fn validate(&self) -> Result {
        self.hyperparameters.validate()?;
        ScoreRange::new(self.score_range.minimum, self.score_range.maximum)?;
        self.factors.validate()?;
        ensure!(
            self.users.len() == self.factors.n_users(),
            "expected {} user IDs, got {}",
            self.factors.n_users(),
            self.users.len(),
        );
        ensure!(
            self.items.len() == self.factors.n_items(),
            "expected {} item IDs, got {}",
            self.factors.n_items(),
            self.items.len(),
        );
        Ok(())
    }

    pub fn predictor(&self) -> Predictor<'_> {
        Predictor::new(&self.factors, self.score_range)
    }

    pub fn user_map(&self) -> IdMap {
        IdMap::from(self.users.clone())
    }

    pub fn item_map(&self) -> IdMap {
        IdMap::from(self.items.clone())
    }
}
