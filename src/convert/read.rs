use csv::StringRecord;
use log::debug;

use super::elements::ElementCodec;
use crate::{
    data::{Row, Value, parse_scalar},
    decode::ErrorPolicy,
    error::{ParseError, Result},
    projection::{NestedSlot, ProjectedColumn, ProjectionMask},
    schema::CsvSchema,
    types::{DataType, Field, RowType},
};

/// Converts token rows into typed rows holding only the projected columns.
///
/// Cells outside the projection are never inspected, so malformed data in an
/// unselected column cannot fail a row.
#[derive(Debug, Clone)]
pub struct ReadConverter {
    columns: Vec<ProjectedColumn>,
    null_token: String,
    elements: ElementCodec,
    policy: ErrorPolicy,
}

impl ReadConverter {
    pub fn new(
        schema: &CsvSchema,
        row_type: &RowType,
        projection: Option<&ProjectionMask>,
        policy: ErrorPolicy,
    ) -> Result<Self> {
        let columns = match projection {
            Some(mask) => mask.resolve(row_type)?,
            None => ProjectionMask::all(row_type).resolve(row_type)?,
        };
        Ok(Self {
            columns,
            null_token: schema.null_token().to_string(),
            elements: ElementCodec::new(schema),
            policy,
        })
    }

    /// Row type of the rows this converter produces.
    pub fn output_row_type(&self) -> RowType {
        self.columns.iter().map(|c| c.field.clone()).collect()
    }

    /// Converts one record. Under [`ErrorPolicy::LenientSkip`] an unparsable
    /// cell in a nullable column becomes null; an error is only returned when
    /// the row cannot be represented at all and must be skipped.
    pub fn convert(&self, record: &StringRecord) -> Result<Row, ParseError> {
        let mut row = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            match self.convert_column(column, record) {
                Ok(value) => row.push(value),
                Err(err) if self.policy == ErrorPolicy::LenientSkip && column.field.nullable => {
                    debug!("Substituting null for unparsable cell: {err}");
                    row.push(None);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(row)
    }

    fn convert_column(
        &self,
        column: &ProjectedColumn,
        record: &StringRecord,
    ) -> Result<Option<Value>, ParseError> {
        let cell = record.get(column.position);
        let Some(NestedSlot { index, width }) = column.nested else {
            return self.convert_token(&column.field.name, &column.field, cell);
        };
        let element = match cell.filter(|token| !self.is_null_token(token)) {
            Some(token) => self
                .split_nested(&column.field.name, token, width)?
                .into_iter()
                .nth(index)
                .flatten(),
            None => None,
        };
        self.convert_element(&column.field.name, &column.field, element)
    }

    fn is_null_token(&self, token: &str) -> bool {
        token == self.null_token
    }

    fn convert_token(
        &self,
        name: &str,
        field: &Field,
        token: Option<&str>,
    ) -> Result<Option<Value>, ParseError> {
        let Some(token) = token else {
            return if field.nullable {
                Ok(None)
            } else {
                Err(ParseError::new(name, "", "missing value for non-nullable column"))
            };
        };
        if self.is_null_token(token) {
            if field.nullable {
                return Ok(None);
            }
            if !self.null_token.is_empty() {
                return Err(ParseError::new(name, token, "null for non-nullable column"));
            }
        }
        self.parse_value(name, &field.data_type, token).map(Some)
    }

    /// Converts one already split array element or nested field.
    fn convert_element(
        &self,
        name: &str,
        field: &Field,
        element: Option<String>,
    ) -> Result<Option<Value>, ParseError> {
        match element {
            None if field.nullable => Ok(None),
            None => Err(ParseError::new(name, &self.null_token, "null for non-nullable field")),
            Some(text) => parse_scalar(&text, &field.data_type)
                .map(Some)
                .map_err(|reason| ParseError::new(name, text, reason)),
        }
    }

    fn split_nested(
        &self,
        name: &str,
        token: &str,
        width: usize,
    ) -> Result<Vec<Option<String>>, ParseError> {
        let parts = self.elements.split(token);
        if parts.len() != width {
            return Err(ParseError::new(
                name,
                token,
                format!("expected {width} nested field(s), found {}", parts.len()),
            ));
        }
        Ok(parts)
    }

    fn parse_value(&self, name: &str, ty: &DataType, token: &str) -> Result<Value, ParseError> {
        match ty {
            DataType::Array(element) => {
                if token.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                self.elements
                    .split(token)
                    .into_iter()
                    .map(|item| match item {
                        None => Ok(None),
                        Some(text) => parse_scalar(&text, element)
                            .map(Some)
                            .map_err(|reason| ParseError::new(name, text, reason)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            DataType::Row(nested) => self
                .split_nested(name, token, nested.len())?
                .into_iter()
                .zip(nested.fields())
                .map(|(part, field)| {
                    let nested_name = format!("{name}.{}", field.name);
                    self.convert_element(&nested_name, field, part)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Row),
            scalar => {
                parse_scalar(token, scalar).map_err(|reason| ParseError::new(name, token, reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{options::FormatOptions, schema::compile};

    fn row_type() -> RowType {
        RowType::new(vec![
            Field::required("id", DataType::Integer),
            Field::new("label", DataType::String),
            Field::new("scores", DataType::array(DataType::Float)),
            Field::new(
                "point",
                DataType::Row(RowType::new(vec![
                    Field::required("x", DataType::Integer),
                    Field::new("y", DataType::Integer),
                ])),
            ),
        ])
    }

    fn converter(options: &FormatOptions, policy: ErrorPolicy) -> ReadConverter {
        let schema = compile(&row_type(), options).unwrap();
        ReadConverter::new(&schema, &row_type(), None, policy).unwrap()
    }

    #[test]
    fn converts_scalars_arrays_and_nested_rows() {
        let conv = converter(&FormatOptions::default(), ErrorPolicy::Strict);
        let record = StringRecord::from(vec!["7", "seven", "1.5;;2", "3;"]);
        let row = conv.convert(&record).unwrap();
        assert_eq!(
            row,
            vec![
                Some(Value::Integer(7)),
                Some(Value::String("seven".into())),
                Some(Value::Array(vec![
                    Some(Value::Float(1.5)),
                    None,
                    Some(Value::Float(2.0))
                ])),
                Some(Value::Row(vec![Some(Value::Integer(3)), None])),
            ]
        );
    }

    #[test]
    fn null_literal_replaces_empty_cell_semantics() {
        let options = FormatOptions {
            null_literal: Some("N/A".into()),
            ..FormatOptions::default()
        };
        let conv = converter(&options, ErrorPolicy::Strict);
        let record = StringRecord::from(vec!["1", "", "", "N/A"]);
        let row = conv.convert(&record).unwrap();
        assert_eq!(row[1], Some(Value::String(String::new())));
        assert_eq!(row[2], Some(Value::Array(Vec::new())));
        assert_eq!(row[3], None);

        let null_id = StringRecord::from(vec!["N/A", "", "", ""]);
        let err = conv.convert(&null_id).unwrap_err();
        assert_eq!(err.column, "id");
    }

    #[test]
    fn short_records_fill_nullable_columns_with_null() {
        let conv = converter(&FormatOptions::default(), ErrorPolicy::Strict);
        let row = conv.convert(&StringRecord::from(vec!["1"])).unwrap();
        assert_eq!(row, vec![Some(Value::Integer(1)), None, None, None]);
        assert!(conv.convert(&StringRecord::new()).is_err());
    }

    #[test]
    fn strict_policy_reports_column_and_value() {
        let conv = converter(&FormatOptions::default(), ErrorPolicy::Strict);
        let err = conv
            .convert(&StringRecord::from(vec!["1", "a", "x;2", ""]))
            .unwrap_err();
        assert_eq!(err.column, "scores");
        assert_eq!(err.value, "x");
    }

    #[test]
    fn lenient_policy_nulls_nullable_cells_and_rejects_required_ones() {
        let conv = converter(&FormatOptions::default(), ErrorPolicy::LenientSkip);
        let row = conv
            .convert(&StringRecord::from(vec!["1", "a", "x;2", "1;2;3"]))
            .unwrap();
        assert_eq!(row[2], None);
        assert_eq!(row[3], None);

        assert!(conv.convert(&StringRecord::from(vec!["one", "a"])).is_err());
    }

    #[test]
    fn nested_projection_parses_only_the_selected_member() {
        let schema = compile(&row_type(), &FormatOptions::default()).unwrap();
        let mask = ProjectionMask::new(vec![vec![3, 0]]);
        let conv = ReadConverter::new(&schema, &row_type(), Some(&mask), ErrorPolicy::Strict)
            .unwrap();
        let row = conv
            .convert(&StringRecord::from(vec!["bad", "x", "bad", "4;bad"]))
            .unwrap();
        assert_eq!(row, vec![Some(Value::Integer(4))]);
        assert_eq!(conv.output_row_type().names(), vec!["point_x"]);
    }

    #[test]
    fn nested_projection_checks_member_count_like_full_rows() {
        let schema = compile(&row_type(), &FormatOptions::default()).unwrap();
        let mask = ProjectionMask::new(vec![vec![3, 0]]);
        let projected =
            ReadConverter::new(&schema, &row_type(), Some(&mask), ErrorPolicy::Strict).unwrap();
        let full = converter(&FormatOptions::default(), ErrorPolicy::Strict);
        let record = StringRecord::from(vec!["1", "x", "", "4;5;extra"]);

        let err = projected.convert(&record).unwrap_err();
        assert!(err.reason.contains("expected 2 nested field(s), found 3"));
        assert!(full.convert(&record).is_err());
    }

    #[test]
    fn escaped_element_delimiters_stay_inside_one_element() {
        let row_type = RowType::new(vec![
            Field::new("tags", DataType::array(DataType::String)),
            Field::new(
                "p",
                DataType::Row(RowType::new(vec![
                    Field::new("x", DataType::String),
                    Field::new("y", DataType::String),
                ])),
            ),
        ]);
        let schema = compile(&row_type, &FormatOptions::default()).unwrap();
        let conv = ReadConverter::new(&schema, &row_type, None, ErrorPolicy::Strict).unwrap();
        let row = conv
            .convert(&StringRecord::from(vec!["a\\;b", "q\\;r;t"]))
            .unwrap();
        assert_eq!(
            row,
            vec![
                Some(Value::Array(vec![Some(Value::String("a;b".into()))])),
                Some(Value::Row(vec![
                    Some(Value::String("q;r".into())),
                    Some(Value::String("t".into())),
                ])),
            ]
        );
    }
}
