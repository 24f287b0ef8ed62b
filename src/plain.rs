//! Record framing for dialects with quoting disabled.
//!
//! Without a quote character the escape character is the only way to carry a
//! delimiter, a line break or a leading comment marker inside a field: the
//! byte after an escape is always literal, on read and on write. Without an
//! escape character such fields cannot be written at all. An empty line reads
//! as a record holding one empty field.

use std::{
    io::{BufRead, BufWriter, Write},
    mem,
};

use csv::{Position, StringRecord};

use crate::{
    error::{CodecError, Result},
    schema::CsvSchema,
};

pub struct PlainReader<R> {
    reader: R,
    delimiter: u8,
    escape: Option<u8>,
    comment: Option<u8>,
    line: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> PlainReader<R> {
    pub fn new(reader: R, schema: &CsvSchema) -> Self {
        Self {
            reader,
            delimiter: schema.delimiter(),
            escape: schema.escape(),
            comment: schema.comment(),
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Reads the next record into `record`. Returns `false` at end of input.
    pub fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        let mut fields: Vec<Vec<u8>> = Vec::new();
        let mut current = Vec::new();
        let mut escaped = false;
        let mut trailing_cr = false;
        let mut start_line = None;

        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                if start_line.is_none() {
                    return Ok(false);
                }
                break;
            }
            self.line += 1;
            if start_line.is_none() {
                if self.comment.is_some() && self.buf.first().copied() == self.comment {
                    continue;
                }
                start_line = Some(self.line);
            }

            let mut terminated = false;
            for &byte in &self.buf {
                if escaped {
                    current.push(byte);
                    escaped = false;
                    trailing_cr = false;
                    continue;
                }
                if byte == b'\n' {
                    terminated = true;
                    break;
                }
                trailing_cr = byte == b'\r';
                if Some(byte) == self.escape {
                    escaped = true;
                } else if byte == self.delimiter {
                    fields.push(mem::take(&mut current));
                } else {
                    current.push(byte);
                }
            }
            if terminated {
                if trailing_cr {
                    current.pop();
                }
                break;
            }
        }
        fields.push(current);

        let line = start_line.unwrap_or(self.line);
        record.clear();
        for field in fields {
            let text = String::from_utf8(field).map_err(|err| CodecError::MalformedRecord {
                line,
                message: format!("invalid UTF-8: {err}"),
            })?;
            record.push_field(&text);
        }
        let mut position = Position::new();
        position.set_line(line);
        record.set_position(Some(position));
        Ok(true)
    }
}

pub struct PlainWriter<W: Write> {
    writer: BufWriter<W>,
    delimiter: u8,
    escape: Option<u8>,
    comment: Option<u8>,
    line: Vec<u8>,
}

impl<W: Write> PlainWriter<W> {
    pub fn new(sink: W, schema: &CsvSchema) -> Self {
        Self {
            writer: BufWriter::new(sink),
            delimiter: schema.delimiter(),
            escape: schema.escape(),
            comment: schema.comment(),
            line: Vec::new(),
        }
    }

    /// Writes one `\n`-terminated record. A cell that would change the record
    /// structure is rejected when no escape character is configured.
    pub fn write_record<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<()> {
        self.line.clear();
        for (idx, cell) in cells.iter().enumerate() {
            if idx > 0 {
                self.line.push(self.delimiter);
            }
            let cell = cell.as_ref();
            for (pos, &byte) in cell.as_bytes().iter().enumerate() {
                let leading_comment = idx == 0 && pos == 0 && Some(byte) == self.comment;
                let special = byte == self.delimiter
                    || byte == b'\n'
                    || byte == b'\r'
                    || Some(byte) == self.escape
                    || leading_comment;
                if special {
                    let escape = self.escape.ok_or_else(|| {
                        CodecError::EncodingInvariant(format!(
                            "cell {cell:?} cannot be written unquoted without an escape character"
                        ))
                    })?;
                    self.line.push(escape);
                }
                self.line.push(byte);
            }
        }
        self.line.push(b'\n');
        self.writer.write_all(&self.line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| CodecError::Io(err.into_error()))
    }
}
