use std::sync::Arc;

use eframe::egui::{self, Color32, Frame, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::Dimension;
use crate::state::{AppState, InputChange};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filters");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            if ui.small_button("Reset").clicked() {
                state.reset_filters();
            }
        });
    });
    ui.separator();

    // The table outlives any state change made below.
    let table = Arc::clone(&state.table);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            date_range(ui, state);
            ui.separator();

            // ---- Per-dimension multi-selects (collapsible) ----
            for dim in Dimension::ALL {
                let n_total = table.options(dim).count();
                let n_selected = state.selection.selected(dim).map_or(0, |s| s.len());
                let header_text = if n_selected == 0 {
                    format!("{dim}  (all {n_total})")
                } else {
                    format!("{dim}  ({n_selected}/{n_total})")
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.column())
                    .default_open(dim == Dimension::Region)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear_dimension(dim);
                        }

                        for value in table.options(dim) {
                            let mut checked = state
                                .selection
                                .selected(dim)
                                .is_some_and(|s| s.contains(value));
                            if ui.checkbox(&mut checked, value).changed() {
                                state.toggle_value(dim, value);
                            }
                        }
                    });
            }
        });
}

/// Start and end date pickers. An inverted range empties the view.
fn date_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Order Date");
    let Some((lo, hi)) = state.table.date_span() else {
        ui.label(RichText::new("No valid order dates").weak());
        return;
    };

    egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("From");
        let mut start = state.selection.start_date.unwrap_or(lo);
        if ui
            .add(DatePickerButton::new(&mut start).id_salt("start_date"))
            .changed()
        {
            state.apply(InputChange::StartDate(Some(start)));
        }
        ui.end_row();

        ui.label("To");
        let mut end = state.selection.end_date.unwrap_or(hi);
        if ui
            .add(DatePickerButton::new(&mut end).id_salt("end_date"))
            .changed()
        {
            state.apply(InputChange::EndDate(Some(end)));
        }
        ui.end_row();
    });
}

// ---------------------------------------------------------------------------
// Top bar – title and KPI strip
// ---------------------------------------------------------------------------

/// Render the title row and the five KPI boxes.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("Sales Dashboard").color(Color32::RED).strong());
    });
    ui.label(
        RichText::new(format!(
            "{} of {} rows match the current filters",
            state.outputs.table.total_rows(),
            state.table.len()
        ))
        .weak(),
    );
    ui.separator();

    ui.columns(5, |cols: &mut [Ui]| {
        for (col, text) in cols.iter_mut().zip(state.outputs.kpi_strings.as_array()) {
            Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.label(RichText::new(text).size(16.0).strong());
                });
            });
        }
    });
    ui.add_space(4.0);
}
