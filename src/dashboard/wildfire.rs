use std::num::NonZeroUsize;

use crate::data::error::DataError;
use crate::data::filter::Filter;
use crate::data::model::{DatasetKind, Table, Value};
use crate::data::pipeline::{Reduction, aggregate, grouped_histogram, histogram, scatter};

use super::{Chart, ChartData, ChartKind, Dashboard, Marker, Mode, YearUsage};

const AREA: &str = "Estimated_fire_area";
const BRIGHTNESS: &str = "Mean_estimated_fire_brightness";
const CONFIDENCE: &str = "Mean_confidence";
const RADIATIVE_POWER: &str = "Mean_estimated_fire_radiative_power";
const REGION: &str = "Region";

/// Approximate centre of each Australian region code used in the dataset.
const REGION_COORDS: [(&str, f64, f64); 7] = [
    ("NSW", -31.8759835, 147.2869493),
    ("QL", -22.1646782, 144.5844903),
    ("SA", -30.5343665, 135.6301212),
    ("TA", -42.035067, 146.6366887),
    ("VI", -36.5986096, 144.6780052),
    ("WA", -25.2303005, 121.0187246),
    ("NT", -19.491411, 132.550964),
];

/// Trends, regional breakdowns, distributions and a region map over the
/// wildfire table.
#[derive(Debug, Clone, Copy)]
pub struct WildfireDashboard {
    bins: NonZeroUsize,
}

impl WildfireDashboard {
    pub fn new(bins: NonZeroUsize) -> Self {
        WildfireDashboard { bins }
    }
}

impl Dashboard for WildfireDashboard {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Wildfire
    }

    fn title(&self) -> &'static str {
        "Australia Wildfire Dashboard"
    }

    fn modes(&self) -> &'static [Mode] {
        &[
            Mode::FireTrends,
            Mode::RegionalBreakdown,
            Mode::Distributions,
            Mode::RegionMap,
        ]
    }

    fn year_usage(&self, mode: Mode) -> YearUsage {
        match mode {
            Mode::RegionalBreakdown | Mode::Distributions | Mode::RegionMap => YearUsage::Optional,
            _ => YearUsage::Ignored,
        }
    }

    fn category_field(&self) -> &'static str {
        REGION
    }

    fn charts(
        &self,
        table: &Table,
        mode: Mode,
        year: Option<i64>,
    ) -> Result<Vec<Chart>, DataError> {
        let filters: Vec<Filter> = year
            .map(|y| Filter::equals("Year", Value::Integer(y)))
            .into_iter()
            .collect();
        let suffix = year.map(|y| format!(" in {y}")).unwrap_or_default();

        match mode {
            Mode::FireTrends => Ok(vec![
                Chart::aggregate(
                    ChartKind::Line,
                    "Estimated Fire Area Over Time (Yearly)",
                    aggregate(table, &[], &["Year"], AREA, Reduction::Mean)?,
                ),
                Chart::aggregate(
                    ChartKind::Line,
                    "Estimated Fire Area Over Time (Monthly)",
                    aggregate(table, &[], &["Year", "Month"], AREA, Reduction::Mean)?,
                ),
            ]),
            Mode::RegionalBreakdown => Ok(vec![
                Chart::aggregate(
                    ChartKind::Bar,
                    format!("Mean Estimated Fire Brightness across Regions{suffix}"),
                    aggregate(table, &filters, &[REGION], BRIGHTNESS, Reduction::Mean)?,
                ),
                Chart::aggregate(
                    ChartKind::Pie,
                    format!("Pixels for Presumed Vegetation Fires by Region{suffix}"),
                    aggregate(table, &filters, &[REGION], "Count", Reduction::Sum)?,
                ),
            ]),
            Mode::Distributions => Ok(vec![
                Chart {
                    kind: ChartKind::Histogram,
                    title: format!("Histogram of Mean Estimated Fire Brightness{suffix}"),
                    x_label: "Mean Estimated Fire Brightness (Kelvin)".to_string(),
                    y_label: "Count".to_string(),
                    data: ChartData::Histogram(histogram(table, &filters, BRIGHTNESS, self.bins)?),
                },
                Chart {
                    kind: ChartKind::Histogram,
                    title: format!("Mean Estimated Fire Brightness by Region (stacked){suffix}"),
                    x_label: "Mean Estimated Fire Brightness (Kelvin)".to_string(),
                    y_label: "Count".to_string(),
                    data: ChartData::GroupedHistogram(grouped_histogram(
                        table, &filters, BRIGHTNESS, REGION, self.bins,
                    )?),
                },
                Chart {
                    kind: ChartKind::Scatter,
                    title: format!("Mean Estimated Fire Radiative Power vs. Mean Confidence{suffix}"),
                    x_label: CONFIDENCE.to_string(),
                    y_label: RADIATIVE_POWER.to_string(),
                    data: ChartData::Points(scatter(table, &filters, CONFIDENCE, RADIATIVE_POWER)?),
                },
            ]),
            Mode::RegionMap => {
                let totals = aggregate(table, &filters, &[REGION], AREA, Reduction::Sum)?;
                let markers = REGION_COORDS
                    .iter()
                    .map(|&(code, lat, lon)| Marker {
                        label: code.to_string(),
                        lat,
                        lon,
                        value: totals
                            .rows
                            .iter()
                            .find(|r| r.key.first() == Some(&Value::from(code)))
                            .and_then(|r| r.value),
                    })
                    .collect();
                Ok(vec![Chart {
                    kind: ChartKind::Map,
                    title: format!("Australia Wildfire Incidents Map{suffix}"),
                    x_label: "Longitude".to_string(),
                    y_label: "Latitude".to_string(),
                    data: ChartData::Markers(markers),
                }])
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> Table {
        let row = |date: (i32, u32, u32), region: &str, area: f64, bright: f64, conf: f64, count: i64| {
            vec![
                Value::Date(NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap()),
                Value::from(region),
                Value::Float(area),
                Value::Float(bright),
                Value::Float(conf),
                Value::Float(conf * 2.0),
                Value::Integer(count),
            ]
        };
        let raw = Table::new(
            DatasetKind::Wildfire.source_schema(),
            vec![
                row((2005, 1, 4), "NSW", 10.0, 300.0, 80.0, 5),
                row((2005, 2, 4), "NSW", 20.0, 310.0, 82.0, 7),
                row((2006, 1, 9), "WA", 40.0, 320.0, 90.0, 3),
                row((2005, 1, 5), "WA", 30.0, 330.0, 70.0, 1),
            ],
        )
        .unwrap();
        DatasetKind::Wildfire.finish(raw).unwrap()
    }

    fn dashboard() -> WildfireDashboard {
        WildfireDashboard::new(NonZeroUsize::new(3).unwrap())
    }

    #[test]
    fn test_trends_group_by_year_and_month() {
        let charts = dashboard().charts(&table(), Mode::FireTrends, None).unwrap();
        let ChartData::Aggregate(yearly) = &charts[0].data else {
            panic!("expected aggregate")
        };
        assert_eq!(yearly.rows[0].value, Some(20.0));
        assert_eq!(yearly.rows[1].value, Some(40.0));

        let ChartData::Aggregate(monthly) = &charts[1].data else {
            panic!("expected aggregate")
        };
        assert_eq!(monthly.key_fields, vec!["Year", "Month"]);
        assert_eq!(
            monthly.rows[0].key,
            vec![Value::Integer(2005), Value::Integer(1)]
        );
        assert_eq!(monthly.rows[0].value, Some(20.0));
        assert_eq!(monthly.len(), 3);
    }

    #[test]
    fn test_regional_breakdown_filters_by_year() {
        let charts = dashboard()
            .charts(&table(), Mode::RegionalBreakdown, Some(2005))
            .unwrap();
        let ChartData::Aggregate(counts) = &charts[1].data else {
            panic!("expected aggregate")
        };
        assert_eq!(counts.rows[0].value, Some(12.0));
        assert_eq!(counts.rows[1].value, Some(1.0));
        assert!(charts[0].title.ends_with("in 2005"));
    }

    #[test]
    fn test_distributions() {
        let charts = dashboard().charts(&table(), Mode::Distributions, None).unwrap();
        let ChartData::Histogram(h) = &charts[0].data else {
            panic!("expected histogram")
        };
        assert_eq!(h.bins.len(), 3);
        assert_eq!(h.total(), 4);

        let ChartData::GroupedHistogram(by_region) = &charts[1].data else {
            panic!("expected grouped histogram")
        };
        assert_eq!(by_region.groups.len(), 2);
        assert_eq!(by_region.groups[0].key, Value::from("NSW"));
        assert_eq!(by_region.groups[0].histogram.total(), 2);
        assert_eq!(by_region.groups[1].histogram.bins[0].start, h.bins[0].start);
        assert_eq!(by_region.groups[1].histogram.bins[2].end, h.bins[2].end);

        let ChartData::Points(points) = &charts[2].data else {
            panic!("expected points")
        };
        assert_eq!(points[0], [80.0, 160.0]);
    }

    #[test]
    fn test_region_map_markers() {
        let charts = dashboard().charts(&table(), Mode::RegionMap, None).unwrap();
        let ChartData::Markers(markers) = &charts[0].data else {
            panic!("expected markers")
        };
        assert_eq!(markers.len(), 7);
        let nsw = markers.iter().find(|m| m.label == "NSW").unwrap();
        assert_eq!(nsw.value, Some(30.0));
        let ta = markers.iter().find(|m| m.label == "TA").unwrap();
        assert_eq!(ta.value, None);
    }
}
