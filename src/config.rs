//! Configuration file handling.
//!
//! Settings come from `statboard.toml` (or the file given with `--config`),
//! then command-line arguments override them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::dashboard::Mode;
use crate::data::model::DatasetKind;

pub const DEFAULT_CONFIG_FILE: &str = "statboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub window: WindowConfig,
}

/// Which file to open at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Data file opened at start-up; none means File → Open.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub dataset: DatasetKind,
}

/// Initial selection and chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Initial mode; none means the dashboard's first mode.
    #[serde(default)]
    pub mode: Option<Mode>,

    /// Initial year; none means the earliest year in the data.
    #[serde(default)]
    pub year: Option<i64>,

    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: NonZeroUsize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            mode: None,
            year: None,
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_histogram_bins() -> NonZeroUsize {
    NonZeroUsize::new(20).unwrap_or(NonZeroUsize::MIN)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: f32,

    #[serde(default = "default_height")]
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> f32 {
    1200.0
}

fn default_height() -> f32 {
    800.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.path {
            self.data.path = Some(path.clone());
        }
        if let Some(dataset) = args.dataset {
            self.data.dataset = dataset;
        }
        if let Some(mode) = args.mode {
            self.dashboard.mode = Some(mode);
        }
        if let Some(year) = args.year {
            self.dashboard.year = Some(year);
        }
        if let Some(bins) = args.bins.and_then(|b| NonZeroUsize::new(b as usize)) {
            self.dashboard.histogram_bins = bins;
        }
    }
}
