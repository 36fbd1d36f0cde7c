use crate::data::error::DataError;
use crate::data::filter::Filter;
use crate::data::model::{DatasetKind, Table, Value};
use crate::data::pipeline::{Reduction, aggregate};

use super::{Chart, ChartKind, Dashboard, Mode, YearUsage};

const SALES: &str = "Automobile_Sales";
const AD_SPEND: &str = "Advertising_Expenditure";
const UNEMPLOYMENT: &str = "unemployment_rate";
const VEHICLE: &str = "Vehicle_Type";

/// Yearly and recession-period statistics over the automobile sales table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomobileDashboard;

impl Dashboard for AutomobileDashboard {
    fn kind(&self) -> DatasetKind {
        DatasetKind::AutomobileSales
    }

    fn title(&self) -> &'static str {
        "Automobile Sales Statistics Dashboard"
    }

    fn modes(&self) -> &'static [Mode] {
        &[Mode::YearlyStatistics, Mode::RecessionStatistics]
    }

    fn year_usage(&self, mode: Mode) -> YearUsage {
        match mode {
            Mode::YearlyStatistics => YearUsage::Required,
            _ => YearUsage::Ignored,
        }
    }

    fn category_field(&self) -> &'static str {
        VEHICLE
    }

    fn charts(
        &self,
        table: &Table,
        mode: Mode,
        year: Option<i64>,
    ) -> Result<Vec<Chart>, DataError> {
        match (mode, year) {
            (Mode::YearlyStatistics, Some(year)) => yearly(table, year),
            (Mode::RecessionStatistics, _) => recession(table),
            _ => Ok(Vec::new()),
        }
    }
}

fn yearly(table: &Table, year: i64) -> Result<Vec<Chart>, DataError> {
    let in_year = [Filter::equals("Year", Value::Integer(year))];

    Ok(vec![
        Chart::aggregate(
            ChartKind::Line,
            "Yearly Automobile Sales Over Time",
            aggregate(table, &[], &["Year"], SALES, Reduction::Mean)?,
        ),
        Chart::aggregate(
            ChartKind::Line,
            format!("Total Monthly Automobile Sales for the Year {year}"),
            aggregate(table, &in_year, &["Month"], SALES, Reduction::Sum)?,
        ),
        Chart::aggregate(
            ChartKind::Bar,
            format!("Average Vehicles Sold by Vehicle Type in the year {year}"),
            aggregate(table, &in_year, &[VEHICLE], SALES, Reduction::Mean)?,
        ),
        Chart::aggregate(
            ChartKind::Pie,
            format!("Advertisement Expenditure by Vehicle Type for the Year {year}"),
            aggregate(table, &in_year, &[VEHICLE], AD_SPEND, Reduction::Sum)?,
        ),
    ])
}

fn recession(table: &Table) -> Result<Vec<Chart>, DataError> {
    let recession = [Filter::one_of("Recession", [Value::Integer(1)])];

    Ok(vec![
        Chart::aggregate(
            ChartKind::Line,
            "Automobile Sales Fluctuation Over Recession Period",
            aggregate(table, &recession, &["Year"], SALES, Reduction::Mean)?,
        ),
        Chart::aggregate(
            ChartKind::Bar,
            "Average Vehicles Sold by Vehicle Type During Recession",
            aggregate(table, &recession, &[VEHICLE], SALES, Reduction::Mean)?,
        ),
        Chart::aggregate(
            ChartKind::Pie,
            "Expenditure Share by Vehicle Type During Recession",
            aggregate(table, &recession, &[VEHICLE], AD_SPEND, Reduction::Sum)?,
        ),
        Chart::aggregate(
            ChartKind::Bar,
            "Effect of Unemployment Rate on Vehicle Type During Recession",
            aggregate(table, &recession, &[VEHICLE], UNEMPLOYMENT, Reduction::Mean)?,
        ),
    ])
}
