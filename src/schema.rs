//! Compilation of a [`RowType`] plus [`FormatOptions`] into a [`CsvSchema`].
//!
//! The compiled schema is the single artifact consumed by both converter
//! directions, so read-side token positions and write-side column order always
//! agree. Every option is an independent override over a documented default:
//!
//! | option                  | default | notes                                  |
//! |-------------------------|---------|----------------------------------------|
//! | `fieldDelimiter`        | `,`     | backslash escapes resolved, first char |
//! | `quoteCharacter`        | `"`     | inert when `quotingDisabled` is set    |
//! | `escapeCharacter`       | none    | first char, not delimiter or quote     |
//! | `allowComments`         | false   | `#` lines skipped on read              |
//! | `arrayElementDelimiter` | `;`     | must not contain the element escape    |
//! | `nullLiteral`           | none    | empty cell stands for null when unset  |

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::{
    error::{CodecError, Result},
    options::{
        self, ARRAY_ELEMENT_DELIMITER, ESCAPE_CHARACTER, FIELD_DELIMITER, FormatOptions,
        QUOTE_CHARACTER,
    },
    types::{DataType, Field, RowType},
};

pub const DEFAULT_FIELD_DELIMITER: u8 = b',';
pub const DEFAULT_QUOTE_CHARACTER: u8 = b'"';
pub const DEFAULT_ARRAY_ELEMENT_DELIMITER: &str = ";";
pub const COMMENT_MARKER: u8 = b'#';
/// Protects element delimiters inside composite cells when no escape is set.
pub const DEFAULT_ELEMENT_ESCAPE: u8 = b'\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSchema {
    columns: Vec<String>,
    delimiter: u8,
    quote: Option<u8>,
    escape: Option<u8>,
    comment: Option<u8>,
    array_element_delimiter: String,
    null_literal: Option<String>,
}

/// Compiles `row_type` and `options` into an immutable [`CsvSchema`].
pub fn compile(row_type: &RowType, options: &FormatOptions) -> Result<CsvSchema> {
    ensure_flat_composites(row_type.fields())?;

    let delimiter = match options.field_delimiter.as_deref() {
        Some(raw) => first_byte(FIELD_DELIMITER, &options::unescape_backslashes(raw))?,
        None => DEFAULT_FIELD_DELIMITER,
    };

    let quote = if options.quoting_disabled {
        None
    } else {
        match options.quote_character.as_deref() {
            Some(raw) => Some(first_byte(QUOTE_CHARACTER, raw)?),
            None => Some(DEFAULT_QUOTE_CHARACTER),
        }
    };
    if quote == Some(delimiter) {
        return Err(CodecError::configuration(
            QUOTE_CHARACTER,
            "quote character must differ from the field delimiter",
        ));
    }

    let comment = options.allow_comments.then_some(COMMENT_MARKER);

    let array_element_delimiter = match options.array_element_delimiter.as_deref() {
        Some("") => {
            return Err(CodecError::configuration(
                ARRAY_ELEMENT_DELIMITER,
                "must not be empty",
            ));
        }
        Some(raw) => raw.to_string(),
        None => DEFAULT_ARRAY_ELEMENT_DELIMITER.to_string(),
    };

    let escape = options
        .escape_character
        .as_deref()
        .map(|raw| first_byte(ESCAPE_CHARACTER, raw))
        .transpose()?;
    if escape.is_some_and(|escape| escape == delimiter || Some(escape) == quote) {
        return Err(CodecError::configuration(
            ESCAPE_CHARACTER,
            "escape character must differ from the field delimiter and quote character",
        ));
    }
    let element_escape = char::from(escape.unwrap_or(DEFAULT_ELEMENT_ESCAPE));
    if array_element_delimiter.contains(element_escape) {
        return Err(CodecError::configuration(
            ARRAY_ELEMENT_DELIMITER,
            format!("must not contain the escape character '{element_escape}'"),
        ));
    }

    Ok(CsvSchema {
        columns: row_type.names(),
        delimiter,
        quote,
        escape,
        comment,
        array_element_delimiter,
        null_literal: options.null_literal.clone(),
    })
}

/// Takes the first character of a configured value; the `csv` crate works on
/// single bytes, so anything outside ASCII is rejected.
fn first_byte(option: &str, value: &str) -> Result<u8> {
    let first = value
        .chars()
        .next()
        .ok_or_else(|| CodecError::configuration(option, "must not be empty"))?;
    if !first.is_ascii() {
        return Err(CodecError::configuration(
            option,
            format!("'{first}' is not a single-byte character"),
        ));
    }
    Ok(first as u8)
}

/// Composite columns occupy one cell, so their members must be scalars.
fn ensure_flat_composites(fields: &[Field]) -> Result<()> {
    for field in fields {
        let nested_composite = match &field.data_type {
            DataType::Array(element) => element.is_composite(),
            DataType::Row(row) => row.fields().iter().any(|f| f.data_type.is_composite()),
            _ => false,
        };
        if nested_composite {
            return Err(CodecError::configuration(
                field.name.as_str(),
                format!(
                    "unsupported column type {}: composite members must be scalar",
                    field.data_type
                ),
            ));
        }
    }
    Ok(())
}

impl CsvSchema {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn quote(&self) -> Option<u8> {
        self.quote
    }

    pub fn escape(&self) -> Option<u8> {
        self.escape
    }

    pub fn comment(&self) -> Option<u8> {
        self.comment
    }

    pub fn array_element_delimiter(&self) -> &str {
        &self.array_element_delimiter
    }

    pub fn null_literal(&self) -> Option<&str> {
        self.null_literal.as_deref()
    }

    /// Escape used inside composite cells: the configured escape, else `\`.
    pub fn element_escape(&self) -> char {
        char::from(self.escape.unwrap_or(DEFAULT_ELEMENT_ESCAPE))
    }

    /// Text written for a null cell or null array element.
    pub fn null_token(&self) -> &str {
        self.null_literal.as_deref().unwrap_or("")
    }

    /// Whether `token` stands for null under this schema.
    pub fn is_null_token(&self, token: &str) -> bool {
        token == self.null_token()
    }

    /// Reader configured for headerless records in this schema's dialect.
    /// Only used for quoted dialects, like [`CsvSchema::writer_builder`].
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .comment(self.comment)
            .escape(self.escape)
            .double_quote(true);
        match self.quote {
            Some(quote) => builder.quote(quote).quoting(true),
            None => builder.quoting(false),
        };
        builder
    }

    /// Writer producing one `\n`-terminated record per row. Only used for
    /// quoted dialects; with quoting disabled records go through
    /// [`crate::plain::PlainWriter`].
    pub fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .comment(self.comment)
            .quote_style(QuoteStyle::Necessary);
        if let Some(quote) = self.quote {
            builder.quote(quote);
        }
        if let Some(escape) = self.escape {
            builder.double_quote(false).escape(escape);
        }
        builder
    }
}
