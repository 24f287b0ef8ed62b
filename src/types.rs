//! Logical row types consumed by the codec.
//!
//! A [`RowType`] is an ordered list of [`Field`]s. Column order is significant:
//! it fixes both the positional token mapping on read and the column order on
//! write. Types deserialize from YAML as either a bare token (`integer`) or a
//! single-key map for composites (`{ array: string }`, `{ row: [...] }`).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Date,
    Time,
    Timestamp,
    Guid,
    /// Elements share one cell, separated by the array element delimiter.
    Array(Box<DataType>),
    /// Nested fields share one cell, separated by the array element delimiter.
    Row(RowType),
}

impl DataType {
    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::String => "string",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Guid => "guid",
            DataType::Array(_) => "array",
            DataType::Row(_) => "row",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Array(_) | DataType::Row(_))
    }

    pub fn describe(&self) -> String {
        match self {
            DataType::Array(element) => format!("array<{}>", element.describe()),
            DataType::Row(row) => {
                let inner = row
                    .fields()
                    .iter()
                    .map(|field| format!("{} {}", field.name, field.data_type.describe()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("row<{inner}>")
            }
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", with = "serde_yaml::with::singleton_map")]
    pub data_type: DataType,
    #[serde(default = "Field::default_nullable")]
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, data_type)
        }
    }

    const fn default_nullable() -> bool {
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowType {
    fields: Vec<Field>,
}

impl RowType {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

impl FromIterator<Field> for RowType {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        RowType::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_renders_nested_types() {
        let ty = DataType::Row(RowType::new(vec![
            Field::new("city", DataType::String),
            Field::new("codes", DataType::array(DataType::Integer)),
        ]));
        assert_eq!(ty.describe(), "row<city string, codes array<integer>>");
    }

    #[test]
    fn fields_deserialize_from_yaml_with_default_nullability() {
        let yaml = r#"
- name: id
  type: integer
  nullable: false
- name: tags
  type:
    array: string
- name: address
  type:
    row:
      - name: city
        type: string
"#;
        let row: RowType = serde_yaml::from_str(yaml).expect("parse row type");
        assert_eq!(row.len(), 3);
        assert!(!row.fields()[0].nullable);
        assert!(row.fields()[1].nullable);
        assert_eq!(row.fields()[1].data_type, DataType::array(DataType::String));
        assert_eq!(row.index_of("address"), Some(2));
        match &row.fields()[2].data_type {
            DataType::Row(nested) => assert_eq!(nested.names(), vec!["city".to_string()]),
            other => panic!("Expected nested row, got {other:?}"),
        }
    }

    #[test]
    fn nested_row_types_survive_yaml_serialization() {
        let row = RowType::new(vec![
            Field::required("id", DataType::Integer),
            Field::new(
                "point",
                DataType::Row(RowType::new(vec![
                    Field::required("x", DataType::Float),
                    Field::new("tags", DataType::array(DataType::String)),
                ])),
            ),
        ]);
        let yaml = serde_yaml::to_string(&row).expect("serialize row type");
        assert!(yaml.contains("row:"));
        assert!(yaml.contains("array: string"));
        let parsed: RowType = serde_yaml::from_str(&yaml).expect("parse row type");
        assert_eq!(parsed, row);
    }
}
