//! Kitbag
//!
//! Loads a bundle catalog and a cart from the fixtures directory, analyses the cart and
//! prints the kits applied, the partial matches and the totals.
//!
//! Use `-c` to pick the catalog fixture and `-k` the cart fixture.
//! Use `--at` to evaluate at another instant than now.

use std::{io, io::Write, time::Instant};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::Timestamp;
use tracing::info;

use kitbag::{
    allocation::{AllocationEngine, AnalysisOptions},
    fixtures::Fixture,
    receipt::write_analysis,
};

mod args;
mod observability;

use args::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    observability::init_subscriber(&args)?;

    let mut fixture = Fixture::with_base_path(&args.fixtures);

    fixture.load_catalog(&args.catalog)?.load_cart(&args.cart)?;

    let catalog = fixture.catalog()?;
    let cart = fixture.cart()?;
    let at = args.at.unwrap_or_else(Timestamp::now);

    info!(
        catalog = %args.catalog,
        cart = %args.cart,
        bundles = catalog.len(),
        excluded = catalog.exclusions().len(),
        "loaded fixtures"
    );

    let engine = AllocationEngine::new(AnalysisOptions {
        suggestion_limit: args.suggestions,
    });

    let start = Instant::now();
    let analysis = engine.analyze(cart, catalog, at)?;
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    write_analysis(&mut handle, &analysis)?;

    writeln!(
        handle,
        "\n Analysed at {at} in {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
