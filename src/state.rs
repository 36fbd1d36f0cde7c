use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::color::ColorMap;
use crate::dashboard::{self, Dashboard, Mode, SelectionChanged, View, YearUsage};
use crate::data::model::{DatasetKind, Table, Value};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until user loads a file). Read-only once loaded.
    pub dataset: Option<Arc<Table>>,

    /// Dataset kind used for the next File → Open.
    pub kind: DatasetKind,

    /// Mode → query mapping for the loaded dataset.
    pub dashboard: Box<dyn Dashboard>,

    /// Current mode / year selection.
    pub selection: SelectionChanged,

    /// Years present in the data, ascending (feeds the year dropdown).
    pub years: Vec<i64>,

    /// Charts for the current selection.
    pub view: View,

    /// Stable colours for the dashboard's category field.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    histogram_bins: NonZeroUsize,
}

impl AppState {
    pub fn new(kind: DatasetKind, histogram_bins: NonZeroUsize) -> Self {
        Self {
            dataset: None,
            kind,
            dashboard: dashboard::for_kind(kind, histogram_bins),
            selection: SelectionChanged::default(),
            years: Vec::new(),
            view: View::Idle,
            color_map: None,
            status_message: None,
            histogram_bins,
        }
    }

    /// Ingest a newly loaded table and select the dashboard's first mode and
    /// the earliest year.
    pub fn set_dataset(&mut self, table: Table, kind: DatasetKind) {
        self.kind = kind;
        self.dashboard = dashboard::for_kind(kind, self.histogram_bins);

        self.years = table
            .distinct("Year")
            .map(|vals| vals.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        let category = self.dashboard.category_field();
        self.color_map = table
            .distinct(category)
            .ok()
            .map(|vals| ColorMap::new(category, &vals));

        self.selection = SelectionChanged {
            mode: self.dashboard.modes().first().copied(),
            year: self.years.first().copied(),
        };

        self.dataset = Some(Arc::new(table));
        self.status_message = None;
        self.refresh();
    }

    /// Re-run the current selection against the loaded table.
    pub fn refresh(&mut self) {
        self.view = match &self.dataset {
            Some(table) => dashboard::dispatch(self.dashboard.as_ref(), table, &self.selection),
            None => View::Idle,
        };
    }

    /// Apply a selection event from the UI.
    pub fn on_selection_changed(&mut self, event: SelectionChanged) {
        if event != self.selection {
            self.selection = event;
            self.refresh();
        }
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.on_selection_changed(SelectionChanged {
            mode: Some(mode),
            ..self.selection
        });
    }

    pub fn select_year(&mut self, year: Option<i64>) {
        self.on_selection_changed(SelectionChanged {
            year,
            ..self.selection
        });
    }

    /// Whether the year control is meaningful for the current mode.
    pub fn year_enabled(&self) -> bool {
        self.selection
            .mode
            .is_some_and(|m| self.dashboard.year_usage(m) != YearUsage::Ignored)
    }
}
