use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::model::DatasetKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(state.dashboard.title());
    ui.separator();

    // ---- Dataset kind used by File → Open ----
    ui.strong("Dataset");
    for kind in [DatasetKind::AutomobileSales, DatasetKind::Wildfire] {
        ui.radio_value(&mut state.kind, kind, kind.label());
    }
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Collect the new selection first, apply it once the widgets are done.
    let mut mode = state.selection.mode;
    let mut year = state.selection.year;

    ui.strong("Select Statistics");
    let modes = state.dashboard.modes();
    egui::ComboBox::from_id_salt("mode")
        .selected_text(mode.map(|m| m.label()).unwrap_or("Select a report type"))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for &m in modes {
                ui.selectable_value(&mut mode, Some(m), m.label());
            }
        });

    ui.add_space(8.0);
    ui.strong("Select Year");
    ui.add_enabled_ui(state.year_enabled(), |ui: &mut Ui| {
        egui::ComboBox::from_id_salt("year")
            .selected_text(year.map(|y| y.to_string()).unwrap_or_else(|| "All years".into()))
            .width(ui.available_width())
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut year, None, "All years");
                for &y in &state.years {
                    ui.selectable_value(&mut year, Some(y), y.to_string());
                }
            });
    });

    if mode != state.selection.mode {
        if let Some(m) = mode {
            state.select_mode(m);
        }
    }
    if year != state.selection.year {
        state.select_year(year);
    }

    // ---- Category legend ----
    if let Some(cm) = &state.color_map {
        ui.separator();
        egui::CollapsingHeader::new(RichText::new(&cm.column).strong())
            .id_salt("legend")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for (label, color) in cm.legend_entries() {
                    ui.label(RichText::new(label).color(color));
                }
            });
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.dataset {
            ui.label(format!(
                "{}: {} rows, {} fields",
                state.kind.label(),
                table.len(),
                table.schema().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open {} data", state.kind.label()))
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path, state.kind) {
            Ok(table) => {
                let kind = state.kind;
                state.set_dataset(table, kind);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
