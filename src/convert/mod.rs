//! Converters between token rows and typed rows.
//!
//! Both directions are built from the same [`crate::schema::CsvSchema`] and
//! dispatch with a `match` over [`crate::types::DataType`]. Composite columns
//! (arrays and nested rows) live in a single cell whose members are separated
//! by the schema's array element delimiter.

mod elements;
pub mod read;
pub mod write;

pub use read::ReadConverter;
pub use write::WriteConverter;
