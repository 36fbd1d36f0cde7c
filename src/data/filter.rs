use std::collections::BTreeSet;

use super::error::DataError;
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Filter predicate: one field, equality or set membership
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The field's value equals the literal exactly (no coercion).
    Equals(Value),
    /// The field's value is one of the set.
    OneOf(BTreeSet<Value>),
}

impl Predicate {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Equals(expected) => value == expected,
            Predicate::OneOf(set) => set.contains(value),
        }
    }
}

/// A predicate over a single named field. Several filters combine
/// conjunctively.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub predicate: Predicate,
}

impl Filter {
    pub fn equals(field: &str, value: Value) -> Self {
        Filter {
            field: field.to_string(),
            predicate: Predicate::Equals(value),
        }
    }

    pub fn one_of(field: &str, values: impl IntoIterator<Item = Value>) -> Self {
        Filter {
            field: field.to_string(),
            predicate: Predicate::OneOf(values.into_iter().collect()),
        }
    }
}

/// Return indices of rows that pass every filter, in table order.
///
/// An empty filter list keeps every row. A filter on a field the table does
/// not have fails with [`DataError::Schema`] before any row is inspected.
pub fn filtered_indices(table: &Table, filters: &[Filter]) -> Result<Vec<usize>, DataError> {
    let resolved: Vec<(usize, &Predicate)> = filters
        .iter()
        .map(|f| Ok((table.schema().field(&f.field)?.0, &f.predicate)))
        .collect::<Result<_, DataError>>()?;

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| resolved.iter().all(|(idx, pred)| pred.matches(&row[*idx])))
        .map(|(i, _)| i)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Field, FieldType, Schema};

    fn int(i: i64) -> Value {
        Value::Integer(i)
    }

    fn table() -> Table {
        let schema = Schema::new(vec![
            Field::new("Year", FieldType::Integer),
            Field::new("Recession", FieldType::Integer),
            Field::new("Vehicle_Type", FieldType::String),
        ])
        .unwrap();
        Table::new(
            schema,
            vec![
                vec![int(1980), int(1), "Sports".into()],
                vec![int(1981), int(0), "Supperminicar".into()],
                vec![int(1980), int(0), "Sports".into()],
                vec![int(1982), int(1), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_no_filters_keeps_all_rows() {
        assert_eq!(filtered_indices(&table(), &[]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_filters_are_conjunctive_and_ordered() {
        let filters = [Filter::equals("Year", int(1980)), Filter::equals("Recession", int(0))];
        assert_eq!(filtered_indices(&table(), &filters).unwrap(), vec![2]);

        let recession = [Filter::equals("Recession", int(1))];
        assert_eq!(filtered_indices(&table(), &recession).unwrap(), vec![0, 3]);
    }

    #[test]
    fn test_one_of_and_null_matching() {
        let years = [Filter::one_of("Year", [int(1981), int(1982)])];
        assert_eq!(filtered_indices(&table(), &years).unwrap(), vec![1, 3]);

        let nulls = [Filter::equals("Vehicle_Type", Value::Null)];
        assert_eq!(filtered_indices(&table(), &nulls).unwrap(), vec![3]);
    }

    #[test]
    fn test_equality_does_not_coerce() {
        let float_year = [Filter::equals("Year", Value::Float(1980.0))];
        assert!(filtered_indices(&table(), &float_year).unwrap().is_empty());

        let case = [Filter::equals("Vehicle_Type", "sports".into())];
        assert!(filtered_indices(&table(), &case).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_field() {
        let err = filtered_indices(&table(), &[Filter::equals("Region", "NSW".into())]).unwrap_err();
        assert_eq!(err, DataError::Schema("Region".to_string()));
    }
}
