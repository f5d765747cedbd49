//! CLI options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand as ClapSubcommand};

use crate::trainer::hyperparameters::Hyperparameters;

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Opts {
    /// Sentry DSN
    #[arg(short, long, env = "SOREC_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate for Sentry
    #[arg(
        long,
        default_value = "0",
        env = "SOREC_TRACES_SAMPLE_RATE",
        value_parser = parsers::sample_rate,
    )]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    Train(TrainOpts),
    Predict(PredictOpts),
}

/// Trains the model on the rating and trust files
#[derive(Args)]
pub struct TrainOpts {
    /// Ratings file: `user item rating` per line
    #[arg(long, env = "SOREC_RATINGS")]
    pub ratings: PathBuf,

    /// Trust file: `trustor trustee [weight]` per line
    #[arg(long, env = "SOREC_TRUST")]
    pub trust: PathBuf,

    /// Trained model output file
    #[arg(short, long, env = "SOREC_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Factor initialization seed, random when omitted
    #[arg(long, env = "SOREC_SEED")]
    pub seed: Option<u64>,

    /// Minimum rating, the lowest observed rating when omitted
    #[arg(long, env = "SOREC_MINIMUM_SCORE")]
    pub minimum_score: Option<f64>,

    /// Maximum rating, the highest observed rating when omitted
    #[arg(long, env = "SOREC_MAXIMUM_SCORE")]
    pub maximum_score: Option<f64>,

    #[command(flatten)]
    pub hyperparameters: Hyperparameters,
}

/// Predicts the ratings with a trained model
#[derive(Args)]
pub struct PredictOpts {
    /// Trained model file
    #[arg(short, long, env = "SOREC_MODEL")]
    pub model: PathBuf,

    /// User ID
    #[arg(short, long)]
    pub user: String,

    /// Item IDs, all the items when omitted
    #[arg(short, long = "item")]
    pub items: Vec<String>,
}
