//! Column projection applied on read.
//!
//! A mask is an ordered list of paths into the full [`RowType`]. A one-element
//! path selects a top-level column; a longer path descends into nested row
//! columns. Output columns follow mask order, and an empty mask yields empty
//! rows.

use crate::{
    error::{CodecError, Result},
    types::{DataType, Field, RowType},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionMask {
    paths: Vec<Vec<usize>>,
}

/// A validated mask entry: where to find the cell and how to type it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectedColumn {
    /// Position of the cell in the full token row.
    pub position: usize,
    pub nested: Option<NestedSlot>,
    pub field: Field,
}

/// Location of one member inside a nested row cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NestedSlot {
    pub index: usize,
    /// Number of members the parent row declares.
    pub width: usize,
}

impl ProjectionMask {
    pub fn new(paths: Vec<Vec<usize>>) -> Self {
        Self { paths }
    }

    pub fn top_level(indices: &[usize]) -> Self {
        Self::new(indices.iter().map(|&idx| vec![idx]).collect())
    }

    pub fn all(row_type: &RowType) -> Self {
        Self::new((0..row_type.len()).map(|idx| vec![idx]).collect())
    }

    /// Resolves column names; `parent.child` addresses a nested row field.
    pub fn from_names<S: AsRef<str>>(row_type: &RowType, names: &[S]) -> Result<Self> {
        let mut paths = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let mut current = row_type;
            let mut path = Vec::new();
            let segments = name.split('.').collect::<Vec<_>>();
            for (depth, segment) in segments.iter().enumerate() {
                let idx = current.index_of(segment).ok_or_else(|| {
                    CodecError::Projection(format!("unknown column '{name}'"))
                })?;
                path.push(idx);
                if depth + 1 < segments.len() {
                    current = match &current.fields()[idx].data_type {
                        DataType::Row(nested) => nested,
                        other => {
                            return Err(CodecError::Projection(format!(
                                "'{segment}' in '{name}' is {other}, not a row"
                            )));
                        }
                    };
                }
            }
            paths.push(path);
        }
        Ok(Self::new(paths))
    }

    pub fn paths(&self) -> &[Vec<usize>] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Row type produced by applying this mask to `row_type`.
    pub fn project(&self, row_type: &RowType) -> Result<RowType> {
        Ok(self
            .resolve(row_type)?
            .into_iter()
            .map(|column| column.field)
            .collect())
    }

    pub(crate) fn resolve(&self, row_type: &RowType) -> Result<Vec<ProjectedColumn>> {
        self.paths
            .iter()
            .map(|path| resolve_path(row_type, path))
            .collect()
    }
}

fn resolve_path(row_type: &RowType, path: &[usize]) -> Result<ProjectedColumn> {
    let (&position, rest) = path
        .split_first()
        .ok_or_else(|| CodecError::Projection("empty projection path".to_string()))?;
    let top = row_type.field(position).ok_or_else(|| {
        CodecError::Projection(format!(
            "column index {position} is out of range for {} column(s)",
            row_type.len()
        ))
    })?;
    match rest {
        [] => Ok(ProjectedColumn {
            position,
            nested: None,
            field: top.clone(),
        }),
        [nested_idx] => {
            let DataType::Row(nested) = &top.data_type else {
                return Err(CodecError::Projection(format!(
                    "column '{}' is {}, not a row",
                    top.name, top.data_type
                )));
            };
            let inner = nested.field(*nested_idx).ok_or_else(|| {
                CodecError::Projection(format!(
                    "nested index {nested_idx} is out of range for column '{}'",
                    top.name
                ))
            })?;
            Ok(ProjectedColumn {
                position,
                nested: Some(NestedSlot {
                    index: *nested_idx,
                    width: nested.len(),
                }),
                field: Field {
                    name: format!("{}_{}", top.name, inner.name),
                    data_type: inner.data_type.clone(),
                    nullable: top.nullable || inner.nullable,
                },
            })
        }
        _ => Err(CodecError::Projection(format!(
            "projection path {path:?} is deeper than the row type"
        ))),
    }
}
