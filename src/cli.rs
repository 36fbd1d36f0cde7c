//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;

use crate::dashboard::Mode;
use crate::data::model::DatasetKind;

/// statboard - automobile sales and wildfire statistics dashboard
///
/// Opens a desktop dashboard over a local CSV, JSON or Parquet file, or
/// writes the selected view as CSV/JSON files with --export.
///
/// Examples:
///   statboard data/historical_automobile_sales.csv
///   statboard data/Historical_Wildfires.csv --dataset wildfire --mode region-map
///   statboard sales.csv --mode yearly-statistics --year 1995 --export reports/sales
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Data file to open (.csv, .json, .parquet)
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Which dataset the file holds
    #[arg(short, long, value_enum, env = "STATBOARD_DATASET")]
    pub dataset: Option<DatasetKind>,

    /// Path to configuration file
    ///
    /// If not specified, looks for statboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial display mode
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Initial year selection
    #[arg(short, long)]
    pub year: Option<i64>,

    /// Number of histogram bins
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u32).range(1..))]
    pub bins: Option<u32>,

    /// Write the selected view to DIR instead of opening a window
    #[arg(short, long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_selection() {
        let args = Args::try_parse_from([
            "statboard",
            "fires.csv",
            "--dataset",
            "wildfire",
            "--mode",
            "regional-breakdown",
            "--year",
            "2010",
            "--bins",
            "30",
            "--export",
            "out",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("fires.csv")));
        assert_eq!(args.dataset, Some(DatasetKind::Wildfire));
        assert_eq!(args.mode, Some(Mode::RegionalBreakdown));
        assert_eq!(args.year, Some(2010));
        assert_eq!(args.bins, Some(30));
        assert_eq!(args.export, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_zero_bins_rejected() {
        assert!(Args::try_parse_from(["statboard", "--bins", "0"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["statboard"]).unwrap();
        assert!(args.path.is_none());
        assert!(args.mode.is_none());
        assert!(!args.verbose);
    }
}
