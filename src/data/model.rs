use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::DataError;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A typed cell value. Tables only ever hold the variant matching their
/// field's [`FieldType`] (or `Null`).
///
/// `Value` is used as a `BTreeMap` key for grouping, so it carries a total
/// order: first by variant, then by value. Equality is that same order, so two
/// values are equal only when they share a variant and compare equal.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::Date(_) => 5,
        }
    }

    /// Numeric view of the value, for reductions and plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Date(a), Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Bool,
    String,
    Date,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Whether `value` may be stored in a field of this type.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (FieldType::Integer, Value::Integer(_))
                | (FieldType::Float, Value::Float(_))
                | (FieldType::Bool, Value::Bool(_))
                | (FieldType::String, Value::String(_))
                | (FieldType::Date, Value::Date(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Date => "date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

impl Field {
    pub fn new(name: &str, ty: FieldType) -> Self {
        Field {
            name: name.to_string(),
            ty,
        }
    }
}

/// Ordered field list; row values are positional against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DataError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Schema { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
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

    /// Look up a field, failing with [`DataError::Schema`] when absent.
    pub fn field(&self, name: &str) -> Result<(usize, &Field), DataError> {
        self.index_of(name)
            .map(|i| (i, &self.fields[i]))
            .ok_or_else(|| DataError::Schema(name.to_string()))
    }

    /// Like [`Schema::field`], additionally requiring a numeric type.
    pub fn numeric_field(&self, name: &str) -> Result<usize, DataError> {
        let (idx, field) = self.field(name)?;
        if !field.ty.is_numeric() {
            return Err(DataError::Type {
                field: name.to_string(),
                found: field.ty,
                expected: "a numeric field",
            });
        }
        Ok(idx)
    }
}

// ---------------------------------------------------------------------------
// Table – immutable, schema-checked rows
// ---------------------------------------------------------------------------

/// One record, positional against the table's schema.
pub type Row = Vec<Value>;

/// A validated, immutable table. Every row has one value per field and every
/// non-null value matches its field's type.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self, DataError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(DataError::RowArity {
                    row: i,
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (field, value) in schema.fields().iter().zip(row) {
                if !field.ty.accepts(value) {
                    return Err(DataError::CellType {
                        row: i,
                        field: field.name.clone(),
                        expected: field.ty,
                    });
                }
            }
        }
        Ok(Table { schema, rows })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one field, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_, DataError> {
        let idx = self.schema.field(name)?.0;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Sorted set of the distinct values of one field.
    pub fn distinct(&self, name: &str) -> Result<BTreeSet<Value>, DataError> {
        Ok(self.column(name)?.cloned().collect())
    }

    /// Append integer `Year` and `Month` fields derived from a date field.
    pub fn with_date_parts(self, date_field: &str) -> Result<Table, DataError> {
        let (idx, field) = self.schema.field(date_field)?;
        if field.ty != FieldType::Date {
            return Err(DataError::Type {
                field: date_field.to_string(),
                found: field.ty,
                expected: "a date field",
            });
        }

        let mut fields = self.schema.fields().to_vec();
        fields.push(Field::new("Year", FieldType::Integer));
        fields.push(Field::new("Month", FieldType::Integer));
        let schema = Schema::new(fields)?;

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                let (year, month) = match &row[idx] {
                    Value::Date(d) => (
                        Value::Integer(d.year() as i64),
                        Value::Integer(d.month() as i64),
                    ),
                    _ => (Value::Null, Value::Null),
                };
                row.push(year);
                row.push(month);
                row
            })
            .collect();

        Ok(Table { schema, rows })
    }
}

// ---------------------------------------------------------------------------
// DatasetKind – the two known sources and their fixed schemas
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    #[default]
    AutomobileSales,
    Wildfire,
}

impl DatasetKind {
    /// Columns read from the source file, in table order.
    pub fn source_schema(self) -> Schema {
        use FieldType::*;
        let fields = match self {
            DatasetKind::AutomobileSales => vec![
                Field::new("Year", Integer),
                Field::new("Month", Integer),
                Field::new("Recession", Integer),
                Field::new("Vehicle_Type", String),
                Field::new("Automobile_Sales", Float),
                Field::new("Advertising_Expenditure", Float),
                Field::new("unemployment_rate", Float),
            ],
            DatasetKind::Wildfire => vec![
                Field::new("Date", Date),
                Field::new("Region", String),
                Field::new("Estimated_fire_area", Float),
                Field::new("Mean_estimated_fire_brightness", Float),
                Field::new("Mean_confidence", Float),
                Field::new("Mean_estimated_fire_radiative_power", Float),
                Field::new("Count", Integer),
            ],
        };
        Schema { fields }
    }

    /// Finish a freshly loaded table: the wildfire source only has a date, so
    /// `Year`/`Month` are derived from it.
    pub fn finish(self, table: Table) -> Result<Table, DataError> {
        match self {
            DatasetKind::AutomobileSales => Ok(table),
            DatasetKind::Wildfire => table.with_date_parts("Date"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::AutomobileSales => "Automobile sales",
            DatasetKind::Wildfire => "Australian wildfires",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_schema() -> Schema {
        Schema::new(vec![
            Field::new("Year", FieldType::Integer),
            Field::new("Type", FieldType::String),
            Field::new("Sales", FieldType::Float),
        ])
        .unwrap()
    }

    #[test]
    fn test_value_order_is_by_variant_then_value() {
        assert!(Value::Null < Value::Integer(-5));
        assert!(Value::Integer(2013) < Value::Float(0.0));
        assert!(Value::from("Car") < Value::from("Truck"));
        assert!(Value::from("Zebra") < Value::from("apple"));
        assert_ne!(Value::Integer(2012), Value::Float(2012.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(vec![
            Field::new("Year", FieldType::Integer),
            Field::new("Year", FieldType::Float),
        ])
        .unwrap_err();
        assert_eq!(err, DataError::DuplicateField("Year".to_string()));
    }

    #[test]
    fn test_table_validates_rows() {
        let arity = Table::new(sales_schema(), vec![vec![Value::Integer(2012)]]).unwrap_err();
        assert!(matches!(arity, DataError::RowArity { row: 0, expected: 3, found: 1 }));

        let typed = Table::new(
            sales_schema(),
            vec![vec![Value::Integer(2012), Value::from("Car"), Value::Integer(100)]],
        )
        .unwrap_err();
        assert!(matches!(typed, DataError::CellType { row: 0, .. }));

        let ok = Table::new(
            sales_schema(),
            vec![vec![Value::Integer(2012), Value::Null, Value::Float(1.0)]],
        )
        .unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[test]
    fn test_numeric_field_checks() {
        let schema = sales_schema();
        assert_eq!(schema.numeric_field("Sales").unwrap(), 2);
        assert!(matches!(
            schema.numeric_field("Type"),
            Err(DataError::Type { .. })
        ));
        assert_eq!(
            schema.numeric_field("Missing"),
            Err(DataError::Schema("Missing".to_string()))
        );
    }

    #[test]
    fn test_distinct_is_sorted() {
        let table = Table::new(
            sales_schema(),
            vec![
                vec![Value::Integer(2013), Value::from("Truck"), Value::Float(1.0)],
                vec![Value::Integer(2012), Value::from("Car"), Value::Float(2.0)],
                vec![Value::Integer(2013), Value::from("Car"), Value::Float(3.0)],
            ],
        )
        .unwrap();
        let years: Vec<i64> = table
            .distinct("Year")
            .unwrap()
            .iter()
            .filter_map(Value::as_i64)
            .collect();
        assert_eq!(years, vec![2012, 2013]);
    }

    #[test]
    fn test_with_date_parts() {
        let schema = Schema::new(vec![Field::new("Date", FieldType::Date)]).unwrap();
        let table = Table::new(
            schema,
            vec![
                vec![Value::Date(NaiveDate::from_ymd_opt(2005, 1, 4).unwrap())],
                vec![Value::Null],
            ],
        )
        .unwrap()
        .with_date_parts("Date")
        .unwrap();

        assert_eq!(table.schema().len(), 3);
        assert_eq!(table.rows()[0][1], Value::Integer(2005));
        assert_eq!(table.rows()[0][2], Value::Integer(1));
        assert!(table.rows()[1][1].is_null());
    }

    #[test]
    fn test_wildfire_schema_gets_year_and_month() {
        let table = Table::new(DatasetKind::Wildfire.source_schema(), Vec::new()).unwrap();
        let finished = DatasetKind::Wildfire.finish(table).unwrap();
        assert!(finished.schema().index_of("Year").is_some());
        assert!(finished.schema().index_of("Month").is_some());
    }
}
