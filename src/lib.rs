pub mod cli;
pub mod convert;
pub mod data;
pub mod decode;
pub mod definition;
pub mod encode;
pub mod error;
pub mod estimate;
pub mod io_utils;
pub mod options;
pub mod plain;
pub mod projection;
pub mod schema;
pub mod transcode;
pub mod types;

pub use data::{Row, Value};
pub use decode::{DecodePipeline, DecodedRows, ErrorPolicy};
pub use encode::{EncodePipeline, RowWriter};
pub use error::{CodecError, ParseError};
pub use estimate::{RowCountEstimate, SampleSource, SampleStats};
pub use options::FormatOptions;
pub use projection::ProjectionMask;
pub use schema::{CsvSchema, compile};
pub use types::{DataType, Field, RowType};

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_rowcodec", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Estimate(args) => handle_estimate(&args),
        Commands::Transcode(args) => transcode::execute(&args),
    }
}

fn handle_estimate(args: &cli::EstimateArgs) -> Result<()> {
    let estimate = estimate::estimate(&args.files);
    info!(
        "Estimated row count for {} file(s): {estimate}",
        args.files.len()
    );
    println!("{estimate}");
    Ok(())
}
