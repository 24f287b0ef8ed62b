use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::TranscodeArgs,
    decode::{DecodePipeline, ErrorPolicy},
    definition::TableDefinition,
    encode::EncodePipeline,
    io_utils,
    options::FormatOptions,
    projection::ProjectionMask,
};

pub fn execute(args: &TranscodeArgs) -> Result<()> {
    let definition = TableDefinition::load(&args.schema)
        .with_context(|| format!("Loading table definition {:?}", args.schema))?;

    let read_options = with_overrides(&definition.options, &args.options)?;
    let write_options = with_overrides(&definition.options, &args.output_options)?;
    let policy = if args.ignore_parse_errors {
        ErrorPolicy::LenientSkip
    } else {
        ErrorPolicy::from_options(&read_options)
    };

    let projection = if args.columns.is_empty() {
        None
    } else {
        Some(ProjectionMask::from_names(&definition.fields, &args.columns)?)
    };

    let decoder = DecodePipeline::new(&definition.fields, &read_options, projection.as_ref(), policy)
        .context("Building decoder")?;
    let encoder = EncodePipeline::new(&decoder.projected_row_type(), &write_options)
        .context("Building encoder")?;

    let input = io_utils::open_input(&args.input)?;
    let output = io_utils::open_output(args.output.as_deref())?;

    let mut rows = decoder.decode(input);
    let mut writer = encoder.writer(output);
    for row in rows.by_ref() {
        let row = row.with_context(|| format!("Decoding {:?}", args.input))?;
        writer.append(&row).context("Encoding row")?;
    }
    let written = writer.rows_written();
    let skipped = rows.skipped_rows();
    writer.finish().context("Flushing output")?;

    info!("Transcoded {written} row(s), skipped {skipped}");
    Ok(())
}

fn with_overrides(base: &FormatOptions, assignments: &[String]) -> Result<FormatOptions> {
    let mut options = base.clone();
    for assignment in assignments {
        options
            .set_assignment(assignment)
            .with_context(|| format!("Applying format option '{assignment}'"))?;
    }
    Ok(options)
}
