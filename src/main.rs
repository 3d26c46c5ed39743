mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;
mod view;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use app::DashboardApp;
use clap::Parser;
use config::Cli;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // No fallback dataset: a load failure stops the process here.
    let table = data::loader::load_file(&cli.data)
        .with_context(|| format!("loading dataset {}", cli.data.display()))
        .inspect_err(|e| log::error!("{e:#}"))?;
    let state = AppState::new(Arc::new(table), cli.dashboard_config());

    if let Some(path) = &cli.snapshot {
        let json = state.outputs.snapshot_json().context("serialising snapshot")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote dashboard snapshot to {}", path.display());
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cli.width, cli.height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("running UI: {e}"))
}
