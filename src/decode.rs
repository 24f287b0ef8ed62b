//! Per-file decoding of CSV records into typed rows.
//!
//! A [`DecodePipeline`] is built once per query and then asked for one
//! [`DecodedRows`] iterator per file. Pipelines hold no per-file state, so
//! distinct files can be decoded concurrently from separate threads.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use csv::StringRecord;
use log::{debug, info};

use crate::{
    convert::ReadConverter,
    data::Row,
    error::{CodecError, Result},
    options::FormatOptions,
    plain::PlainReader,
    projection::ProjectionMask,
    schema::{self, CsvSchema},
    types::RowType,
};

/// What to do with a record whose cells cannot be converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first bad record and report its line.
    #[default]
    Strict,
    /// Null out bad nullable cells; skip rows that still cannot be represented.
    LenientSkip,
}

impl ErrorPolicy {
    pub fn from_options(options: &FormatOptions) -> Self {
        if options.ignore_parse_errors {
            ErrorPolicy::LenientSkip
        } else {
            ErrorPolicy::Strict
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodePipeline {
    schema: CsvSchema,
    converter: ReadConverter,
    policy: ErrorPolicy,
}

impl DecodePipeline {
    /// Compiles the schema for the full `row_type`; `projection` selects which
    /// columns the produced rows contain.
    pub fn new(
        row_type: &RowType,
        options: &FormatOptions,
        projection: Option<&ProjectionMask>,
        policy: ErrorPolicy,
    ) -> Result<Self> {
        let schema = schema::compile(row_type, options)?;
        let converter = ReadConverter::new(&schema, row_type, projection, policy)?;
        Ok(Self {
            schema,
            converter,
            policy,
        })
    }

    pub fn schema(&self) -> &CsvSchema {
        &self.schema
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn projected_row_type(&self) -> RowType {
        self.converter.output_row_type()
    }

    /// Starts decoding a byte stream from its first record.
    pub fn decode<R: Read>(&self, reader: R) -> DecodedRows<'_, R> {
        let records = match self.schema.quote() {
            Some(_) => RecordReader::Quoted(self.schema.reader_builder().from_reader(reader)),
            None => RecordReader::Plain(PlainReader::new(BufReader::new(reader), &self.schema)),
        };
        DecodedRows {
            records,
            width: self.schema.columns().len(),
            record: StringRecord::new(),
            converter: &self.converter,
            policy: self.policy,
            skipped: 0,
            finished: false,
        }
    }

    pub fn decode_path(&self, path: &Path) -> Result<DecodedRows<'_, BufReader<File>>> {
        debug!("Decoding {path:?}");
        let file = File::open(path)?;
        Ok(self.decode(BufReader::new(file)))
    }
}

enum RecordReader<R> {
    Quoted(csv::Reader<R>),
    Plain(PlainReader<BufReader<R>>),
}

impl<R: Read> RecordReader<R> {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        match self {
            RecordReader::Quoted(reader) => {
                reader.read_record(record).map_err(CodecError::from_csv)
            }
            RecordReader::Plain(reader) => reader.read_record(record),
        }
    }
}

/// Lazy sequence of typed rows from one input, in file order.
///
/// In strict mode the first error is yielded and iteration ends. In lenient
/// mode unconvertible or malformed records are skipped and counted; I/O
/// errors still end iteration. Short records are padded with nulls; records
/// with more fields than the row type are malformed.
pub struct DecodedRows<'a, R> {
    records: RecordReader<R>,
    width: usize,
    record: StringRecord,
    converter: &'a ReadConverter,
    policy: ErrorPolicy,
    skipped: u64,
    finished: bool,
}

impl<R> DecodedRows<'_, R> {
    pub fn skipped_rows(&self) -> u64 {
        self.skipped
    }
}

impl<R: Read> Iterator for DecodedRows<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let error = match self.records.read_record(&mut self.record) {
                Ok(false) => {
                    self.finished = true;
                    if self.skipped > 0 {
                        info!("Skipped {} unparsable row(s)", self.skipped);
                    }
                    return None;
                }
                Ok(true) => {
                    let line = self.record.position().map_or(0, |pos| pos.line());
                    if self.record.len() > self.width {
                        CodecError::MalformedRecord {
                            line,
                            message: format!(
                                "expected at most {} field(s), found {}",
                                self.width,
                                self.record.len()
                            ),
                        }
                    } else {
                        match self.converter.convert(&self.record) {
                            Ok(row) => return Some(Ok(row)),
                            Err(source) => CodecError::Parse { line, source },
                        }
                    }
                }
                Err(err) => err,
            };
            let recoverable = !matches!(error, CodecError::Io(_));
            if self.policy == ErrorPolicy::LenientSkip && recoverable {
                self.skipped += 1;
                debug!("Skipping row: {error}");
                continue;
            }
            self.finished = true;
            return Some(Err(error));
        }
    }
}
