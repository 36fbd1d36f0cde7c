//! Selection layer: maps a UI selection to a fixed list of pipeline calls
//! and returns a render-ready [`View`].
//!
//! Each dataset has a [`Dashboard`] describing its display modes. The UI
//! raises a [`SelectionChanged`] event whenever the mode or year changes and
//! hands it to [`dispatch`], which never fails: query errors come back as
//! [`View::Failed`] so a live session keeps running.

mod automobile;
mod wildfire;

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::data::error::DataError;
use crate::data::model::{DatasetKind, Table};
use crate::data::pipeline::{AggregateTable, GroupedHistogram, Histogram};

pub use automobile::AutomobileDashboard;
pub use wildfire::WildfireDashboard;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    YearlyStatistics,
    RecessionStatistics,
    FireTrends,
    RegionalBreakdown,
    Distributions,
    RegionMap,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::YearlyStatistics => "Yearly Statistics",
            Mode::RecessionStatistics => "Recession Period Statistics",
            Mode::FireTrends => "Fire Trends",
            Mode::RegionalBreakdown => "Regional Breakdown",
            Mode::Distributions => "Distributions",
            Mode::RegionMap => "Region Map",
        }
    }
}

/// How a mode treats the selected year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearUsage {
    Ignored,
    Optional,
    Required,
}

/// Raised by the UI whenever the display mode or the year changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionChanged {
    pub mode: Option<Mode>,
    pub year: Option<i64>,
}

// ---------------------------------------------------------------------------
// Render-ready output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Histogram,
    Scatter,
    Map,
}

/// A labelled point on the region map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChartData {
    Aggregate(AggregateTable),
    Histogram(Histogram),
    /// Per-category histograms drawn stacked.
    GroupedHistogram(GroupedHistogram),
    Points(Vec<[f64; 2]>),
    Markers(Vec<Marker>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

impl Chart {
    /// Chart over an aggregate: key fields on x, reduced field on y.
    pub fn aggregate(kind: ChartKind, title: impl Into<String>, table: AggregateTable) -> Self {
        Chart {
            kind,
            title: title.into(),
            x_label: table.key_fields.join(", "),
            y_label: table.value_field.clone(),
            data: ChartData::Aggregate(table),
        }
    }
}

/// Result of one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum View {
    /// Nothing selected yet (or the selection is incomplete).
    Idle,
    Charts(Vec<Chart>),
    /// The query failed; the message is shown in place of the charts.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// A fixed mapping from display modes to chart queries over one dataset.
pub trait Dashboard {
    fn kind(&self) -> DatasetKind;

    fn title(&self) -> &'static str;

    /// Modes in the order the UI offers them; the first is the default.
    fn modes(&self) -> &'static [Mode];

    fn year_usage(&self, mode: Mode) -> YearUsage;

    /// Categorical field whose values get stable colours across charts.
    fn category_field(&self) -> &'static str;

    /// Run the mode's queries. `year` is only `Some` when the mode uses it.
    fn charts(&self, table: &Table, mode: Mode, year: Option<i64>)
        -> Result<Vec<Chart>, DataError>;
}

/// Dashboard for a dataset kind.
pub fn for_kind(kind: DatasetKind, histogram_bins: NonZeroUsize) -> Box<dyn Dashboard> {
    match kind {
        DatasetKind::AutomobileSales => Box::new(AutomobileDashboard),
        DatasetKind::Wildfire => Box::new(WildfireDashboard::new(histogram_bins)),
    }
}

/// Turn a selection into a view. Incomplete selections are [`View::Idle`];
/// query errors are logged and returned as [`View::Failed`].
pub fn dispatch(dashboard: &dyn Dashboard, table: &Table, event: &SelectionChanged) -> View {
    let Some(mode) = event.mode else {
        return View::Idle;
    };
    if !dashboard.modes().contains(&mode) {
        log::debug!("{} has no {mode:?} mode", dashboard.title());
        return View::Idle;
    }

    let year = match dashboard.year_usage(mode) {
        YearUsage::Ignored => None,
        YearUsage::Optional => event.year,
        YearUsage::Required => match event.year {
            Some(y) => Some(y),
            None => return View::Idle,
        },
    };

    log::debug!("dispatch {mode:?} year={year:?}");
    match dashboard.charts(table, mode, year) {
        Ok(charts) => View::Charts(charts),
        Err(e) => {
            log::warn!("{} query failed: {e}", mode.label());
            View::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Field, FieldType, Schema, Value};

    fn sales_table() -> Table {
        let schema = DatasetKind::AutomobileSales.source_schema();
        let row = |year: i64, month: i64, rec: i64, ty: &str, sales: f64, ad: f64, un: f64| {
            vec![
                Value::Integer(year),
                Value::Integer(month),
                Value::Integer(rec),
                Value::from(ty),
                Value::Float(sales),
                Value::Float(ad),
                Value::Float(un),
            ]
        };
        Table::new(
            schema,
            vec![
                row(1980, 1, 1, "Sports", 100.0, 10.0, 5.0),
                row(1980, 2, 1, "Supperminicar", 300.0, 30.0, 7.0),
                row(1981, 1, 0, "Sports", 200.0, 20.0, 3.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_no_mode_is_idle() {
        let view = dispatch(&AutomobileDashboard, &sales_table(), &SelectionChanged::default());
        assert_eq!(view, View::Idle);
    }

    #[test]
    fn test_yearly_without_year_is_idle() {
        let event = SelectionChanged {
            mode: Some(Mode::YearlyStatistics),
            year: None,
        };
        assert_eq!(dispatch(&AutomobileDashboard, &sales_table(), &event), View::Idle);
    }

    #[test]
    fn test_foreign_mode_is_idle() {
        let event = SelectionChanged {
            mode: Some(Mode::FireTrends),
            year: None,
        };
        assert_eq!(dispatch(&AutomobileDashboard, &sales_table(), &event), View::Idle);
    }

    #[test]
    fn test_recession_ignores_year() {
        let with_year = SelectionChanged {
            mode: Some(Mode::RecessionStatistics),
            year: Some(1981),
        };
        let without = SelectionChanged {
            mode: Some(Mode::RecessionStatistics),
            year: None,
        };
        let table = sales_table();
        let a = dispatch(&AutomobileDashboard, &table, &with_year);
        assert!(matches!(&a, View::Charts(c) if c.len() == 4));
        assert_eq!(a, dispatch(&AutomobileDashboard, &table, &without));
    }

    #[test]
    fn test_schema_mismatch_fails_softly() {
        let schema = Schema::new(vec![Field::new("Year", FieldType::Integer)]).unwrap();
        let table = Table::new(schema, vec![vec![Value::Integer(1980)]]).unwrap();
        let event = SelectionChanged {
            mode: Some(Mode::RecessionStatistics),
            year: None,
        };
        match dispatch(&AutomobileDashboard, &table, &event) {
            View::Failed(msg) => assert!(msg.contains("unknown field"), "{msg}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_for_kind_picks_dashboard() {
        let bins = NonZeroUsize::new(20).unwrap();
        assert_eq!(for_kind(DatasetKind::Wildfire, bins).kind(), DatasetKind::Wildfire);
        assert_eq!(
            for_kind(DatasetKind::AutomobileSales, bins).modes()[0],
            Mode::YearlyStatistics
        );
    }

    #[test]
    fn test_view_serializes_with_state_tag() {
        let json = serde_json::to_value(View::Failed("boom".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["detail"], "boom");
        let idle = serde_json::to_value(View::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }
}
