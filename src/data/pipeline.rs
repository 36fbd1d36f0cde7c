use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use serde::Serialize;

use super::error::DataError;
use super::filter::{Filter, filtered_indices};
use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Query vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Mean,
    Sum,
}

/// Running total for one group. Null target values are skipped.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn finish(self, reduction: Reduction) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match reduction {
            Reduction::Sum => Some(self.sum),
            Reduction::Mean => Some(self.sum / self.count as f64),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateTable – one row per group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// Key values, one per group-key field.
    pub key: Vec<Value>,
    /// Reduced target; `None` when every target value in the group was null.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub key_fields: Vec<String>,
    pub value_field: String,
    pub reduction: Reduction,
    /// Ascending by key tuple.
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable label of a row's key, e.g. `"2012 / 3"` for a
    /// (Year, Month) key.
    pub fn key_label(row: &AggregateRow) -> String {
        row.key
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

// ---------------------------------------------------------------------------
// aggregate
// ---------------------------------------------------------------------------

/// Filter `table`, group the surviving rows by `group_key`, and reduce
/// `target` within each group.
///
/// Groups come out ascending by key tuple (first key field primary), so the
/// result does not depend on input row order. Zero surviving rows give a
/// zero-row result, not an error.
pub fn aggregate(
    table: &Table,
    filters: &[Filter],
    group_key: &[&str],
    target: &str,
    reduction: Reduction,
) -> Result<AggregateTable, DataError> {
    if group_key.is_empty() {
        return Err(DataError::EmptyGroupKey);
    }
    let schema = table.schema();
    let key_idx: Vec<usize> = group_key
        .iter()
        .map(|name| schema.field(name).map(|(i, _)| i))
        .collect::<Result<_, _>>()?;
    let target_idx = schema.numeric_field(target)?;
    let indices = filtered_indices(table, filters)?;

    let mut groups: BTreeMap<Vec<Value>, Accumulator> = BTreeMap::new();
    for &i in &indices {
        let row = &table.rows()[i];
        let key: Vec<Value> = key_idx.iter().map(|&k| row[k].clone()).collect();
        groups.entry(key).or_default().push(row[target_idx].as_f64());
    }

    log::debug!(
        "aggregate {reduction:?}({target}) by {group_key:?}: {} of {} rows in {} groups",
        indices.len(),
        table.len(),
        groups.len()
    );

    Ok(AggregateTable {
        key_fields: group_key.iter().map(|s| s.to_string()).collect(),
        value_field: target.to_string(),
        reduction,
        rows: groups
            .into_iter()
            .map(|(key, acc)| AggregateRow {
                key,
                value: acc.finish(reduction),
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Histogram / scatter chart data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub field: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Equal-width histogram of a numeric field over the filtered rows.
///
/// Bins span `[min, max]` of the finite values; every bin is half-open
/// except the last, which also holds `max`. A constant column spans
/// `value ± 0.5`. Nulls, NaN and infinities are not counted; with no finite
/// values there are no bins.
pub fn histogram(
    table: &Table,
    filters: &[Filter],
    field: &str,
    bins: NonZeroUsize,
) -> Result<Histogram, DataError> {
    let idx = table.schema().numeric_field(field)?;
    let values: Vec<f64> = filtered_indices(table, filters)?
        .into_iter()
        .filter_map(|i| finite(&table.rows()[i][idx]))
        .collect();

    let bins = match bin_range(&values) {
        Some((lo, hi)) => count_bins(&values, lo, hi, bins.get()),
        None => Vec::new(),
    };
    Ok(Histogram {
        field: field.to_string(),
        bins,
    })
}

/// One group's share of a [`GroupedHistogram`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramGroup {
    pub key: Value,
    pub histogram: Histogram,
}

/// Per-group histograms of one field, all on the same bin edges so they can
/// be stacked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedHistogram {
    pub field: String,
    pub group_field: String,
    /// Ascending by group key.
    pub groups: Vec<HistogramGroup>,
}

/// Histogram of `field` split by the values of `group_field`.
///
/// Edges come from the finite values of all groups together; a group with
/// no finite values is left out.
pub fn grouped_histogram(
    table: &Table,
    filters: &[Filter],
    field: &str,
    group_field: &str,
    bins: NonZeroUsize,
) -> Result<GroupedHistogram, DataError> {
    let idx = table.schema().numeric_field(field)?;
    let (group_idx, _) = table.schema().field(group_field)?;

    let mut by_group: BTreeMap<Value, Vec<f64>> = BTreeMap::new();
    for i in filtered_indices(table, filters)? {
        let row = &table.rows()[i];
        if let Some(v) = finite(&row[idx]) {
            by_group.entry(row[group_idx].clone()).or_default().push(v);
        }
    }

    let all: Vec<f64> = by_group.values().flatten().copied().collect();
    let groups = match bin_range(&all) {
        Some((lo, hi)) => by_group
            .into_iter()
            .map(|(key, values)| HistogramGroup {
                key,
                histogram: Histogram {
                    field: field.to_string(),
                    bins: count_bins(&values, lo, hi, bins.get()),
                },
            })
            .collect(),
        None => Vec::new(),
    };
    Ok(GroupedHistogram {
        field: field.to_string(),
        group_field: group_field.to_string(),
        groups,
    })
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// `[min, max]` of the values, widened to `value ± 0.5` when they are all equal.
fn bin_range(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi == lo {
        Some((lo - 0.5, hi + 0.5))
    } else {
        Some((lo, hi))
    }
}

fn count_bins(values: &[f64], lo: f64, hi: f64, n: usize) -> Vec<Bin> {
    let width = (hi - lo) / n as f64;
    let mut counts = vec![0usize; n];
    for v in values {
        let slot = (((v - lo) / width) as usize).min(n - 1);
        counts[slot] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + i as f64 * width,
            end: if i + 1 == n { hi } else { lo + (i + 1) as f64 * width },
            count,
        })
        .collect()
}

/// `[x, y]` pairs from the filtered rows where both values are present.
pub fn scatter(
    table: &Table,
    filters: &[Filter],
    x: &str,
    y: &str,
) -> Result<Vec<[f64; 2]>, DataError> {
    let xi = table.schema().numeric_field(x)?;
    let yi = table.schema().numeric_field(y)?;
    Ok(filtered_indices(table, filters)?
        .into_iter()
        .filter_map(|i| {
            let row = &table.rows()[i];
            Some([row[xi].as_f64()?, row[yi].as_f64()?])
        })
        .collect())
}
