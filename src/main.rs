mod app;
mod cli;
mod color;
mod config;
mod dashboard;
mod data;
mod export;
mod state;
mod ui;

use anyhow::{Result, bail};
use app::StatboardApp;
use clap::Parser;
use eframe::egui;

use config::Config;
use dashboard::View;
use state::AppState;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(&args);

    let state = initial_state(&config, args.export.is_some())?;

    if let Some(dir) = &args.export {
        let written = export::export_view(&state.view, dir)?;
        log::info!("Exported {} files to {}", written.len(), dir.display());
        if let View::Failed(msg) = &state.view {
            bail!("selected view failed: {msg}");
        }
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Statboard – Statistics Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(StatboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}

/// Load the configured file (if any) and apply the configured selection.
///
/// A load failure is fatal for headless export; the window instead starts
/// empty and shows the error in the status bar.
fn initial_state(config: &Config, headless: bool) -> Result<AppState> {
    let kind = config.data.dataset;
    let mut state = AppState::new(kind, config.dashboard.histogram_bins);

    let Some(path) = &config.data.path else {
        if headless {
            bail!("--export needs a data file");
        }
        return Ok(state);
    };

    match data::loader::load_file(path, kind) {
        Ok(table) => state.set_dataset(table, kind),
        Err(e) if headless => return Err(e),
        Err(e) => {
            log::error!("Failed to load {}: {e:#}", path.display());
            state.status_message = Some(format!("Error: {e:#}"));
            return Ok(state);
        }
    }

    if let Some(mode) = config.dashboard.mode {
        state.select_mode(mode);
    }
    if let Some(year) = config.dashboard.year {
        state.select_year(Some(year));
    }
    Ok(state)
}
