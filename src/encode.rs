//! Row-at-a-time CSV encoding onto a caller-supplied byte sink.

use std::io::{self, Write};

use crate::{
    convert::WriteConverter,
    data::Value,
    error::{CodecError, Result},
    options::FormatOptions,
    plain::PlainWriter,
    schema::{self, CsvSchema},
    types::RowType,
};

#[derive(Debug, Clone)]
pub struct EncodePipeline {
    schema: CsvSchema,
    row_type: RowType,
    converter: WriteConverter,
}

impl EncodePipeline {
    pub fn new(row_type: &RowType, options: &FormatOptions) -> Result<Self> {
        let schema = schema::compile(row_type, options)?;
        let converter = WriteConverter::new(&schema, row_type);
        Ok(Self {
            schema,
            row_type: row_type.clone(),
            converter,
        })
    }

    pub fn schema(&self) -> &CsvSchema {
        &self.schema
    }

    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    pub fn writer<W: Write>(&self, sink: W) -> RowWriter<'_, W> {
        let records = match self.schema.quote() {
            Some(_) => RecordWriter::Quoted {
                writer: self.schema.writer_builder().from_writer(sink),
                escape: self.schema.escape().map(char::from),
            },
            None => RecordWriter::Plain(PlainWriter::new(sink, &self.schema)),
        };
        RowWriter {
            records,
            converter: &self.converter,
            rows_written: 0,
        }
    }

    /// Encodes `rows` into an in-memory buffer.
    pub fn encode_to_vec<I>(&self, rows: I) -> Result<Vec<u8>>
    where
        I: IntoIterator,
        I::Item: AsRef<[Option<Value>]>,
    {
        let mut writer = self.writer(Vec::new());
        writer.append_all(rows)?;
        writer.finish()
    }
}

enum RecordWriter<W: Write> {
    /// `escape` is set when quotes are escaped instead of doubled; the escape
    /// character itself is then doubled before the `csv` writer quotes the cell.
    Quoted {
        writer: csv::Writer<W>,
        escape: Option<char>,
    },
    Plain(PlainWriter<W>),
}

impl<W: Write> RecordWriter<W> {
    fn write_record(&mut self, cells: &[String]) -> Result<()> {
        match self {
            RecordWriter::Quoted {
                writer,
                escape: Some(escape),
            } => {
                let doubled = escape.to_string().repeat(2);
                writer
                    .write_record(cells.iter().map(|cell| cell.replace(*escape, &doubled)))
                    .map_err(CodecError::from_csv)
            }
            RecordWriter::Quoted {
                writer,
                escape: None,
            } => writer.write_record(cells).map_err(CodecError::from_csv),
            RecordWriter::Plain(writer) => writer.write_record(cells),
        }
    }

    fn finish(self) -> Result<W> {
        match self {
            RecordWriter::Quoted { mut writer, .. } => {
                writer.flush()?;
                writer.into_inner().map_err(|err| {
                    CodecError::Io(io::Error::new(err.error().kind(), err.to_string()))
                })
            }
            RecordWriter::Plain(mut writer) => {
                writer.flush()?;
                writer.into_inner()
            }
        }
    }
}

pub struct RowWriter<'a, W: Write> {
    records: RecordWriter<W>,
    converter: &'a WriteConverter,
    rows_written: u64,
}

impl<W: Write> RowWriter<'_, W> {
    /// Writes one record. Rows that do not match the pipeline's row type are
    /// rejected before anything reaches the sink.
    pub fn append(&mut self, row: &[Option<Value>]) -> Result<()> {
        let cells = self.converter.convert(row)?;
        self.records.write_record(&cells)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn append_all<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[Option<Value>]>,
    {
        for row in rows {
            self.append(row.as_ref())?;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes buffered records and hands the sink back.
    pub fn finish(self) -> Result<W> {
        self.records.finish()
    }
}
