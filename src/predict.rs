//! Scores the items for a user with a trained model.

use serde::Serialize;

use crate::opts::PredictOpts;
use crate::prelude::*;
use crate::trainer::model::Model;
use crate::trainer::predictor::RatingPredictor;

#[derive(Serialize)]
struct Prediction<'a> {
    user: &'a str,
    item: &'a str,
    score: f64,
}

#[instrument(skip_all, fields(user = opts.user.as_str()))]
pub fn run(opts: PredictOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "predict"));

    let model = Model::load(&opts.model)?;
    for prediction in predict(&model, &opts.user, &opts.items)? {
        println!("{}", serde_json::to_string(&prediction)?);
    }
    Ok(())
}

/// Predicts the given items, or all the items when none are given.
fn predict<'a>(model: &'a Model, user_id: &'a str, item_ids: &'a [String]) -> Result<Vec<Prediction<'a>>> {
    let users = model.user_map();
    let items = model.item_map();
    let user = users
        .get(user_id)
        .ok_or_else(|| anyhow!("user `{}` is unknown", user_id))?;
    let item_ids: Vec<&str> = if item_ids.is_empty() {
        model.items.iter().map(String::as_str).collect()
    } else {
        item_ids.iter().map(String::as_str).collect()
    };

    let predictor = model.predictor();
    item_ids
        .into_iter()
        .map(|item_id| {
            let item = items
                .get(item_id)
                .ok_or_else(|| anyhow!("item `{}` is unknown", item_id))?;
            let score = predictor.predict_features(&[user, item], &[])?;
            Ok(Prediction {
                user: user_id,
                item: item_id,
                score,
            })
        })
        .collect()
}
