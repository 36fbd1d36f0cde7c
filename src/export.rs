//! Headless output: one CSV per chart plus the whole view as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::dashboard::{Chart, ChartData, View};
use crate::data::model::Value;
use crate::data::pipeline::AggregateTable;

pub const VIEW_FILE: &str = "view.json";

/// File name for a chart's data, derived from its title:
/// `"Yearly Automobile Sales Over Time"` → `Yearly_Automobile_Sales_Over_Time.csv`.
pub fn chart_file_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len() + 4);
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if !name.ends_with('_') {
            name.push('_');
        }
    }
    let trimmed = name.trim_matches('_');
    format!("{}.csv", if trimmed.is_empty() { "chart" } else { trimmed })
}

/// Write a chart's data as CSV with a header row.
pub fn write_chart_csv<W: Write>(chart: &Chart, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    match &chart.data {
        ChartData::Aggregate(table) => write_aggregate(&mut out, table)?,
        ChartData::Histogram(h) => {
            out.write_record(["bin_start", "bin_end", "count"])?;
            for bin in &h.bins {
                out.write_record([
                    bin.start.to_string(),
                    bin.end.to_string(),
                    bin.count.to_string(),
                ])?;
            }
        }
        ChartData::GroupedHistogram(gh) => {
            out.write_record([gh.group_field.as_str(), "bin_start", "bin_end", "count"])?;
            for group in &gh.groups {
                let key = raw_cell(&group.key);
                for bin in &group.histogram.bins {
                    out.write_record([
                        key.clone(),
                        bin.start.to_string(),
                        bin.end.to_string(),
                        bin.count.to_string(),
                    ])?;
                }
            }
        }
        ChartData::Points(points) => {
            out.write_record([chart.x_label.as_str(), chart.y_label.as_str()])?;
            for [x, y] in points {
                out.write_record([x.to_string(), y.to_string()])?;
            }
        }
        ChartData::Markers(markers) => {
            out.write_record(["label", "lat", "lon", "value"])?;
            for m in markers {
                out.write_record([
                    m.label.clone(),
                    m.lat.to_string(),
                    m.lon.to_string(),
                    optional(m.value),
                ])?;
            }
        }
    }
    out.flush().context("flushing CSV")?;
    Ok(())
}

fn write_aggregate<W: Write>(out: &mut csv::Writer<W>, table: &AggregateTable) -> Result<()> {
    let header: Vec<&str> = table
        .key_fields
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(table.value_field.as_str()))
        .collect();
    out.write_record(&header)?;

    for row in &table.rows {
        let record: Vec<String> = row
            .key
            .iter()
            .map(|v| if v.is_null() { String::new() } else { raw_cell(v) })
            .chain(std::iter::once(optional(row.value)))
            .collect();
        out.write_record(&record)?;
    }
    Ok(())
}

/// Cell text without the display rounding applied to floats.
fn raw_cell(value: &Value) -> String {
    match value {
        Value::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write `view` into `dir`: `view.json` always, plus one CSV per chart.
/// Returns the paths written.
pub fn export_view(view: &View, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    let mut written = Vec::new();
    if let View::Charts(charts) = view {
        for chart in charts {
            let path = dir.join(chart_file_name(&chart.title));
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_chart_csv(chart, BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote {} ({:?})", path.display(), chart.kind);
            written.push(path);
        }
    }

    let json_path = dir.join(VIEW_FILE);
    let file = File::create(&json_path)
        .with_context(|| format!("creating {}", json_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, view).context("writing view JSON")?;
    writer.flush().context("flushing view JSON")?;
    written.push(json_path);

    Ok(written)
}
