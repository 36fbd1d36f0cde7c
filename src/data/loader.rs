use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DatasetKind, FieldType, Row, Schema, Table, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Columns are matched by name against the dataset's fixed schema; extra
/// source columns are ignored and a missing one is an error.
///
/// Supported formats:
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "Year": 1980, "Vehicle_Type": "Sports", ... }, ...]`
/// * `.parquet` – flat columns (strings, ints, floats, bools, dates)
pub fn load_file(path: &Path, kind: DatasetKind) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let schema = kind.source_schema();
    let rows = match ext.as_str() {
        "csv" => load_csv(path, &schema)?,
        "json" => load_json(path, &schema)?,
        "parquet" | "pq" => load_parquet(path, &schema)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let table = Table::new(schema, rows).context("validating loaded rows")?;
    let table = kind.finish(table).context("deriving fields")?;
    log::info!(
        "Loaded {} rows ({} fields) of {} from {}",
        table.len(),
        table.schema().len(),
        kind.label(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, schema: &Schema) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let positions: Vec<usize> = schema
        .fields()
        .iter()
        .map(|f| {
            headers
                .iter()
                .position(|h| *h == f.name)
                .with_context(|| format!("CSV missing '{}' column", f.name))
        })
        .collect::<Result<_>>()?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = schema
            .fields()
            .iter()
            .zip(&positions)
            .map(|(field, &pos)| {
                parse_cell(record.get(pos).unwrap_or(""), field.ty)
                    .with_context(|| format!("CSV row {row_no}, column '{}'", field.name))
            })
            .collect::<Result<Row>>()?;
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`).
fn load_json(path: &Path, schema: &Schema) -> Result<Vec<Row>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let row = schema
            .fields()
            .iter()
            .map(|field| {
                let raw = obj
                    .get(&field.name)
                    .with_context(|| format!("Row {i}: missing '{}'", field.name))?;
                conform(json_to_value(raw)?, field.ty)
                    .with_context(|| format!("Row {i}, column '{}'", field.name))
            })
            .collect::<Result<Row>>()?;
        rows.push(row);
    }
    Ok(rows)
}

fn json_to_value(val: &JsonValue) -> Result<Value> {
    Ok(match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                bail!("number {n} out of range")
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => bail!("nested JSON value {other} is not a table cell"),
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns include the schema's fields.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`, dates as
/// nanosecond timestamps) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, schema: &Schema) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = rows.len();
        append_batch(&batch, schema, offset, &mut rows)?;
    }
    Ok(rows)
}

/// Convert one record batch into rows. `offset` is the file row number of the
/// batch's first row, used in error messages.
fn append_batch(
    batch: &RecordBatch,
    schema: &Schema,
    offset: usize,
    rows: &mut Vec<Row>,
) -> Result<()> {
    let batch_schema = batch.schema();
    let columns: Vec<&Arc<dyn Array>> = schema
        .fields()
        .iter()
        .map(|f| {
            batch_schema
                .index_of(&f.name)
                .map(|i| batch.column(i))
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", f.name))
        })
        .collect::<Result<_>>()?;

    rows.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = schema
            .fields()
            .iter()
            .zip(&columns)
            .map(|(field, col)| {
                conform(arrow_value(col, row)?, field.ty)
                    .with_context(|| format!("Row {}, column '{}'", offset + row, field.name))
            })
            .collect::<Result<Row>>()?;
        rows.push(values);
    }
    Ok(())
}

/// Extract a single value from an Arrow column at a given row.
fn arrow_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    Ok(match col.data_type() {
        DataType::Utf8 => Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => Value::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Value::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        DataType::Date32 => date_value(col.as_primitive::<Date32Type>().value_as_date(row))?,
        DataType::Date64 => date_value(col.as_primitive::<Date64Type>().value_as_date(row))?,
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col.as_primitive::<TimestampSecondType>().value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            date_value(datetime.map(|dt| dt.date()))?
        }
        other => bail!("unsupported column type {other:?}"),
    })
}

fn date_value(date: Option<NaiveDate>) -> Result<Value> {
    date.map(Value::Date).context("date out of range")
}

// ---------------------------------------------------------------------------
// Cell typing
// ---------------------------------------------------------------------------

/// Parse a text cell as the given field type. Empty cells are null.
fn parse_cell(raw: &str, ty: FieldType) -> Result<Value> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(Value::Null);
    }
    Ok(match ty {
        FieldType::String => Value::String(s.to_string()),
        FieldType::Float => Value::Float(
            s.parse::<f64>()
                .with_context(|| format!("'{s}' is not a number"))?,
        ),
        FieldType::Integer => Value::Integer(parse_integer(s)?),
        FieldType::Bool => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => bail!("'{s}' is not a boolean"),
        },
        FieldType::Date => Value::Date(parse_date(s)?),
    })
}

/// Integers may arrive as `"3"`, `"3.0"`, or as a month name (`"Mar"`).
fn parse_integer(s: &str) -> Result<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.fract() == 0.0 && f.is_finite() {
            return Ok(f as i64);
        }
    }
    month_number(s).with_context(|| format!("'{s}' is not an integer"))
}

fn month_number(s: &str) -> Option<i64> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = s.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as i64 + 1)
}

/// Accepts `YYYY-MM-DD` and `M/D/YYYY`, ignoring any trailing time part.
fn parse_date(s: &str) -> Result<NaiveDate> {
    let day = s
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%m/%d/%Y"))
        .with_context(|| format!("'{s}' is not a date"))
}

/// Fit an already-typed source value (JSON, Arrow) into a field type.
fn conform(value: Value, ty: FieldType) -> Result<Value> {
    if ty.accepts(&value) {
        return Ok(value);
    }
    Ok(match (ty, value) {
        (FieldType::Float, Value::Integer(i)) => Value::Float(i as f64),
        (FieldType::Integer, Value::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            Value::Integer(f as i64)
        }
        (FieldType::Bool, Value::Integer(i @ (0 | 1))) => Value::Bool(i == 1),
        (ty, Value::String(s)) => parse_cell(&s, ty)?,
        (ty, other) => bail!("{other} does not fit a {ty} field"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
        TimestampNanosecondArray,
    };
    use parquet::arrow::ArrowWriter;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const SALES_CSV: &str = "\
Date,Year,Month,Recession,Consumer_Confidence,Automobile_Sales,Advertising_Expenditure,Vehicle_Type,unemployment_rate
1/31/1980,1980,Jan,1,108.24,456.0,1558,Supperminicar,5.4
2/29/1980,1980,Feb,1,98.75,555.9,3048,Supperminicar,4.8
3/31/1980,1980,Mar,1,107.48,,3137,Mediumfamilycar,3.4
";

    #[test]
    fn test_load_sales_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sales.csv", SALES_CSV);
        let table = load_file(&path, DatasetKind::AutomobileSales).unwrap();

        assert_eq!(table.len(), 3);
        let schema = table.schema();
        let month = schema.index_of("Month").unwrap();
        let sales = schema.index_of("Automobile_Sales").unwrap();
        let ad = schema.index_of("Advertising_Expenditure").unwrap();
        assert_eq!(table.rows()[1][month], Value::Integer(2));
        assert_eq!(table.rows()[0][sales], Value::Float(456.0));
        assert!(table.rows()[2][sales].is_null());
        // integer text in a float column
        assert_eq!(table.rows()[0][ad], Value::Float(1558.0));
        // extra columns are dropped
        assert!(schema.index_of("Consumer_Confidence").is_none());
    }

    #[test]
    fn test_missing_column_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "Year,Month\n1980,1\n");
        let err = load_file(&path, DatasetKind::AutomobileSales).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'Recession'"));
    }

    #[test]
    fn test_mistyped_cell_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = SALES_CSV.replace("456.0", "lots");
        let path = write_file(&dir, "bad.csv", &bad);
        let err = load_file(&path, DatasetKind::AutomobileSales).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("row 0"), "{msg}");
        assert!(msg.contains("Automobile_Sales"), "{msg}");
    }

    #[test]
    fn test_load_wildfire_csv_derives_year_and_month() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "\
Region,Date,Estimated_fire_area,Mean_estimated_fire_brightness,Mean_estimated_fire_radiative_power,Mean_confidence,Std_confidence,Var_confidence,Count,Replaced
NSW,2005-01-04,8.68,312.27,42.4,78.3,2.3,5.3,11,R
NT,1/5/2005,16.61,322.48,62.36,85.5,8.1,65.3,9,R
";
        let path = write_file(&dir, "fires.csv", csv);
        let table = load_file(&path, DatasetKind::Wildfire).unwrap();
        let year = table.schema().index_of("Year").unwrap();
        let month = table.schema().index_of("Month").unwrap();
        assert_eq!(table.rows()[0][year], Value::Integer(2005));
        assert_eq!(table.rows()[1][month], Value::Integer(1));
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"[
            {"Year": 1980, "Month": "Jan", "Recession": 1, "Vehicle_Type": "Sports",
             "Automobile_Sales": 100, "Advertising_Expenditure": 1500.5, "unemployment_rate": null},
            {"Year": 1981.0, "Month": 2, "Recession": 0, "Vehicle_Type": "Sports",
             "Automobile_Sales": 120.5, "Advertising_Expenditure": 900, "unemployment_rate": 4.1}
        ]"#;
        let path = write_file(&dir, "sales.json", json);
        let table = load_file(&path, DatasetKind::AutomobileSales).unwrap();
        assert_eq!(table.rows()[0][0], Value::Integer(1980));
        assert_eq!(table.rows()[1][0], Value::Integer(1981));
        assert_eq!(table.rows()[0][1], Value::Integer(1));
        assert_eq!(table.rows()[0][4], Value::Float(100.0));
        assert!(table.rows()[0][6].is_null());
    }

    fn write_parquet(dir: &tempfile::TempDir, name: &str, batch: &RecordBatch) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn sales_batch(months: &[&str]) -> RecordBatch {
        let n = months.len();
        RecordBatch::try_from_iter(vec![
            ("Year", Arc::new(Int64Array::from(vec![1980; n])) as ArrayRef),
            ("Month", Arc::new(StringArray::from(months.to_vec())) as ArrayRef),
            ("Recession", Arc::new(Int32Array::from(vec![1; n])) as ArrayRef),
            ("Vehicle_Type", Arc::new(StringArray::from(vec!["Sports"; n])) as ArrayRef),
            (
                "Automobile_Sales",
                Arc::new(Float64Array::from(
                    (0..n).map(|i| (i == 0).then_some(456.0)).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
            ("Advertising_Expenditure", Arc::new(Int64Array::from(vec![1558; n])) as ArrayRef),
            ("unemployment_rate", Arc::new(Float32Array::from(vec![5.5; n])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_sales_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(&dir, "sales.parquet", &sales_batch(&["Jan", "Feb"]));
        let table = load_file(&path, DatasetKind::AutomobileSales).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Value::Integer(1980));
        // month names stored as text
        assert_eq!(table.rows()[1][1], Value::Integer(2));
        assert_eq!(table.rows()[0][2], Value::Integer(1));
        assert_eq!(table.rows()[0][4], Value::Float(456.0));
        assert!(table.rows()[1][4].is_null());
        // Int64 into a float field, Float32 widened
        assert_eq!(table.rows()[0][5], Value::Float(1558.0));
        assert_eq!(table.rows()[0][6], Value::Float(5.5));
    }

    #[test]
    fn test_parquet_missing_column_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let batch = RecordBatch::try_from_iter(vec![
            ("Year", Arc::new(Int64Array::from(vec![1980])) as ArrayRef),
            ("Month", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ])
        .unwrap();
        let path = write_parquet(&dir, "bad.parquet", &batch);
        let err = load_file(&path, DatasetKind::AutomobileSales).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'Recession'"));
    }

    #[test]
    fn test_load_wildfire_parquet_with_timestamps() {
        let nanos = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp_nanos_opt()
                .unwrap()
        };
        let batch = RecordBatch::try_from_iter(vec![
            (
                "Date",
                Arc::new(TimestampNanosecondArray::from(vec![
                    nanos(2005, 1, 4),
                    nanos(2005, 2, 1),
                ])) as ArrayRef,
            ),
            ("Region", Arc::new(StringArray::from(vec!["NSW", "WA"])) as ArrayRef),
            ("Estimated_fire_area", Arc::new(Float64Array::from(vec![8.5, 16.0])) as ArrayRef),
            (
                "Mean_estimated_fire_brightness",
                Arc::new(Float64Array::from(vec![312.0, 322.0])) as ArrayRef,
            ),
            ("Mean_confidence", Arc::new(Float64Array::from(vec![78.0, 85.0])) as ArrayRef),
            (
                "Mean_estimated_fire_radiative_power",
                Arc::new(Float64Array::from(vec![42.0, 62.0])) as ArrayRef,
            ),
            ("Count", Arc::new(Int64Array::from(vec![11, 9])) as ArrayRef),
        ])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_parquet(&dir, "fires.parquet", &batch);
        let table = load_file(&path, DatasetKind::Wildfire).unwrap();

        assert_eq!(
            table.rows()[0][0],
            Value::Date(NaiveDate::from_ymd_opt(2005, 1, 4).unwrap())
        );
        let year = table.schema().index_of("Year").unwrap();
        let month = table.schema().index_of("Month").unwrap();
        assert_eq!(table.rows()[1][year], Value::Integer(2005));
        assert_eq!(table.rows()[1][month], Value::Integer(2));
    }

    #[test]
    fn test_parquet_errors_report_file_row() {
        let schema = DatasetKind::AutomobileSales.source_schema();
        let mut rows = Vec::new();
        append_batch(&sales_batch(&["Jan", "Feb"]), &schema, 0, &mut rows).unwrap();
        let err = append_batch(&sales_batch(&["Mar", "Foo"]), &schema, rows.len(), &mut rows)
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 3, column 'Month'"), "{msg}");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("data.xlsx"), DatasetKind::Wildfire).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_cell_parsing() {
        assert_eq!(parse_cell("  ", FieldType::Float).unwrap(), Value::Null);
        assert_eq!(parse_cell("December", FieldType::Integer).unwrap(), Value::Integer(12));
        assert_eq!(parse_cell("sep", FieldType::Integer).unwrap(), Value::Integer(9));
        assert!(parse_cell("Ma", FieldType::Integer).is_err());
        assert_eq!(parse_cell("1", FieldType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(
            parse_cell("2005-01-04 00:00:00", FieldType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2005, 1, 4).unwrap())
        );
        assert!(conform(Value::Float(2.5), FieldType::Integer).is_err());
    }
}
