mod app;
mod chart;
mod color;
mod config;
mod data;
mod event;
mod export;
mod state;
mod ui;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use eframe::egui;

use app::EmissionsApp;
use config::{Command, Config};
use data::geo::{self, GeoError};
use data::model::EmissionTable;
use state::AppState;

/// Load the startup table, logging the full error chain on failure.
fn load_table(path: &Path) -> Result<EmissionTable> {
    data::loader::load_file(path).map_err(|e| {
        let e = e.context(format!("loading {}", path.display()));
        log::error!("{e:#}");
        e
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::from_env()? {
        Command::Run(config) => config,
        Command::Help => {
            println!("{}", config::USAGE);
            return Ok(());
        }
    };
    log::debug!("{config:?}");

    // The table is loaded once; failing here is fatal.
    let table = load_table(&config.data_path)?;
    if table.is_empty() {
        log::warn!("{} has no emission rows", config.data_path.display());
    }

    let world = match geo::load_geojson(&config.geometry_path) {
        Ok(world) if world.is_empty() => {
            log::warn!(
                "{} has no usable country outlines; map view disabled",
                config.geometry_path.display()
            );
            None
        }
        Ok(world) => Some(world),
        Err(e @ GeoError::NotFound(_)) => {
            log::warn!("{e}; map view disabled");
            None
        }
        Err(e) => {
            log::error!("Failed to load {}: {e}", config.geometry_path.display());
            None
        }
    };

    let state = AppState::new(Arc::new(table), world);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(ui::panels::APP_TITLE)
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        ui::panels::APP_TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(EmissionsApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
