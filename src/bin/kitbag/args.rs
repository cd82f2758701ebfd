//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use jiff::Timestamp;

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Analyse a cart fixture against a bundle catalog fixture.
#[derive(Debug, Parser)]
#[command(name = "kitbag", version)]
pub struct Args {
    /// Directory holding the `catalogs/` and `carts/` fixtures
    #[arg(long, env = "KITBAG_FIXTURES", default_value = "./fixtures")]
    pub fixtures: PathBuf,

    /// Catalog fixture to load
    #[arg(short, long, default_value = "storefront")]
    pub catalog: String,

    /// Cart fixture to analyse
    #[arg(short = 'k', long, default_value = "mega-hair")]
    pub cart: String,

    /// Evaluation instant (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<Timestamp>,

    /// Maximum number of suggested kits
    #[arg(short, long, default_value_t = 5)]
    pub suggestions: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
