use thiserror::Error;

use super::model::FieldType;

/// Errors raised by the typed table core.
///
/// Loading (file access, parse failures) is reported through `anyhow` by the
/// loader; these variants describe a table or query that does not fit the
/// schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A query or table operation named a field the schema does not have.
    #[error("unknown field '{0}'")]
    Schema(String),

    /// A field was used where its type does not fit, e.g. a numeric
    /// reduction over a string column.
    #[error("field '{field}' has type {found}, expected {expected}")]
    Type {
        field: String,
        found: FieldType,
        expected: &'static str,
    },

    #[error("group key must name at least one field")]
    EmptyGroupKey,

    #[error("field '{0}' appears more than once in the schema")]
    DuplicateField(String),

    #[error("row {row}: expected {expected} values, found {found}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: field '{field}' expects {expected}")]
    CellType {
        row: usize,
        field: String,
        expected: FieldType,
    },
}
