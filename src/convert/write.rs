use super::elements::ElementCodec;
use crate::{
    data::{Value, value_matches},
    error::{CodecError, Result},
    schema::CsvSchema,
    types::{Field, RowType},
};

/// Renders typed rows as string cells in [`RowType`] order.
///
/// Total for rows that conform to the row type. Anything else is a caller bug
/// and is reported as [`CodecError::EncodingInvariant`] rather than coerced.
/// Composite members are escaped so delimiters inside them survive a read.
/// Without a null literal, empty string members read back as null. An array
/// holding a single null element renders like an empty array (no null
/// literal) or like a null cell (with one).
#[derive(Debug, Clone)]
pub struct WriteConverter {
    fields: Vec<Field>,
    null_token: String,
    elements: ElementCodec,
}

impl WriteConverter {
    pub fn new(schema: &CsvSchema, row_type: &RowType) -> Self {
        Self {
            fields: row_type.fields().to_vec(),
            null_token: schema.null_token().to_string(),
            elements: ElementCodec::new(schema),
        }
    }

    pub fn convert(&self, row: &[Option<Value>]) -> Result<Vec<String>> {
        if row.len() != self.fields.len() {
            return Err(CodecError::EncodingInvariant(format!(
                "expected {} column(s), found {}",
                self.fields.len(),
                row.len()
            )));
        }
        row.iter()
            .zip(&self.fields)
            .map(|(value, field)| self.convert_cell(value.as_ref(), field))
            .collect()
    }

    fn convert_cell(&self, value: Option<&Value>, field: &Field) -> Result<String> {
        let Some(value) = value else {
            if field.nullable {
                return Ok(self.null_token.clone());
            }
            return Err(CodecError::EncodingInvariant(format!(
                "null in non-nullable column '{}'",
                field.name
            )));
        };
        if !value_matches(value, &field.data_type) {
            return Err(CodecError::EncodingInvariant(format!(
                "column '{}' expects {}, found {}",
                field.name,
                field.data_type,
                value.type_name()
            )));
        }
        Ok(self.render(value))
    }

    fn render(&self, value: &Value) -> String {
        match value {
            Value::Array(items) | Value::Row(items) => self
                .elements
                .join(items.iter().map(|item| item.as_ref().map(Value::as_display))),
            scalar => scalar.as_display(),
        }
    }
}
