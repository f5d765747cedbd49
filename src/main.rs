#![warn(clippy::all)]

use clap::Parser;

use crate::helpers::tracing::format_elapsed;
use crate::opts::{Opts, Subcommand};
use crate::prelude::*;

mod helpers;
mod math;
mod opts;
mod predict;
mod prelude;
mod trainer;

fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = helpers::tracing::init(opts.sentry_dsn, opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let start_instant = Instant::now();
    let result = match opts.subcommand {
        Subcommand::Train(opts) => trainer::run(opts),
        Subcommand::Predict(opts) => predict::run(opts),
    };
    if let Err(error) = &result {
        sentry::integrations::anyhow::capture_anyhow(error);
    }
    info!(elapsed = format_elapsed(start_instant).as_str(), "finished");
    result
}
