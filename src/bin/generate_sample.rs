//! Writes small synthetic automobile-sales and wildfire files to `sample_data/`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const OUTPUT_DIR: &str = "sample_data";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const RECESSION_YEARS: [i64; 11] = [1980, 1981, 1982, 1991, 2000, 2001, 2007, 2008, 2009, 2020, 2021];

/// (vehicle type, sales weight, typical price)
const VEHICLES: [(&str, f64, f64); 5] = [
    ("Supperminicar", 1.0, 14_000.0),
    ("Smallfamiliycar", 1.4, 21_000.0),
    ("Mediumfamilycar", 1.2, 27_000.0),
    ("Executivecar", 0.6, 45_000.0),
    ("Sports", 0.4, 60_000.0),
];

const REGIONS: [&str; 7] = ["NSW", "NT", "QL", "SA", "TA", "VI", "WA"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Automobile sales
// ---------------------------------------------------------------------------

struct SalesRecord {
    date: NaiveDate,
    year: i64,
    month: usize,
    recession: i64,
    vehicle: &'static str,
    sales: f64,
    price: f64,
    advertising: f64,
    unemployment: f64,
}

fn sales_records(rng: &mut SimpleRng) -> Result<Vec<SalesRecord>> {
    let mut records = Vec::new();
    for year in 1980..=2023_i64 {
        let recession = i64::from(RECESSION_YEARS.contains(&year));
        for month in 0..12 {
            let (vehicle, weight, base_price) = VEHICLES[rng.below(VEHICLES.len())];
            // Recession years sell less and cheaper cars and spend less on ads.
            let slump = if recession == 1 { 0.6 } else { 1.0 };
            let season = 1.0 + 0.15 * ((month as f64 / 12.0) * std::f64::consts::TAU).sin();
            let sales = (3000.0 * weight * slump * season + rng.gauss(0.0, 150.0)).max(10.0);
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32 + 1, 1)
                .context("building sample date")?;
            records.push(SalesRecord {
                date,
                year,
                month,
                recession,
                vehicle,
                sales: round2(sales),
                price: round2(base_price * slump + rng.gauss(0.0, 1500.0)),
                advertising: round2((2500.0 * slump + rng.gauss(0.0, 400.0)).max(100.0)),
                unemployment: round2(if recession == 1 {
                    rng.gauss(6.5, 1.0)
                } else {
                    rng.gauss(3.5, 0.8)
                }
                .max(1.0)),
            });
        }
    }
    Ok(records)
}

fn write_sales_csv(records: &[SalesRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Date",
        "Year",
        "Month",
        "Recession",
        "Price",
        "Advertising_Expenditure",
        "unemployment_rate",
        "Automobile_Sales",
        "Vehicle_Type",
    ])?;
    for r in records {
        writer.write_record([
            r.date.format("%Y-%m-%d").to_string(),
            r.year.to_string(),
            MONTHS[r.month].to_string(),
            r.recession.to_string(),
            r.price.to_string(),
            r.advertising.to_string(),
            r.unemployment.to_string(),
            r.sales.to_string(),
            r.vehicle.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_sales_parquet(records: &[SalesRecord], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Year", DataType::Int64, false),
        Field::new("Month", DataType::Int64, false),
        Field::new("Recession", DataType::Int64, false),
        Field::new("Vehicle_Type", DataType::Utf8, false),
        Field::new("Automobile_Sales", DataType::Float64, false),
        Field::new("Advertising_Expenditure", DataType::Float64, false),
        Field::new("unemployment_rate", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.year))),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| r.month as i64 + 1),
            )),
            Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.recession))),
            Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.vehicle))),
            Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.sales))),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.advertising),
            )),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.unemployment),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Wildfires
// ---------------------------------------------------------------------------

fn write_wildfire_csv(rng: &mut SimpleRng, path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Region",
        "Date",
        "Estimated_fire_area",
        "Mean_estimated_fire_brightness",
        "Mean_estimated_fire_radiative_power",
        "Mean_confidence",
        "Std_confidence",
        "Var_confidence",
        "Count",
        "Replaced",
    ])?;

    let start = NaiveDate::from_ymd_opt(2005, 1, 4).context("sample start date")?;
    let end = NaiveDate::from_ymd_opt(2020, 12, 31).context("sample end date")?;
    let mut rows = 0;
    let mut date = start;
    while date <= end {
        // Southern hemisphere: fire season peaks around January.
        let season = 1.0 + 0.8 * ((date.month0() as f64 / 12.0) * std::f64::consts::TAU).cos();
        for (i, region) in REGIONS.iter().enumerate() {
            let scale = 1.0 + i as f64 * 0.35;
            let area = (40.0 * scale * season + rng.gauss(0.0, 15.0)).max(1.0);
            let confidence = rng.gauss(85.0, 4.0).clamp(0.0, 100.0);
            writer.write_record([
                region.to_string(),
                date.format("%-m/%-d/%Y").to_string(),
                format!("{area:.6}"),
                format!("{:.6}", rng.gauss(315.0, 8.0)),
                format!("{:.6}", (area * 1.6 + rng.gauss(0.0, 10.0)).max(1.0)),
                format!("{confidence:.6}"),
                format!("{:.6}", rng.gauss(6.0, 1.0).abs()),
                format!("{:.6}", rng.gauss(40.0, 8.0).abs()),
                ((area / 8.0).ceil() as i64).to_string(),
                if date.year() < 2020 { "R" } else { "N" }.to_string(),
            ])?;
            rows += 1;
        }
        date += Duration::days(7);
    }
    writer.flush()?;
    Ok(rows)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let dir = Path::new(OUTPUT_DIR);
    std::fs::create_dir_all(dir).with_context(|| format!("creating {OUTPUT_DIR}"))?;

    let records = sales_records(&mut rng)?;
    write_sales_csv(&records, &dir.join("automobile_sales.csv"))?;
    write_sales_parquet(&records, &dir.join("automobile_sales.parquet"))?;
    println!(
        "Wrote {} automobile sales rows to {OUTPUT_DIR}/automobile_sales.{{csv,parquet}}",
        records.len()
    );

    let fires = write_wildfire_csv(&mut rng, &dir.join("wildfire.csv"))?;
    println!("Wrote {fires} wildfire rows to {OUTPUT_DIR}/wildfire.csv");
    Ok(())
}
