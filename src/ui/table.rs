use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use serde_json::Value;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Paginated data table
// ---------------------------------------------------------------------------

/// Render the pager and the current page of filtered rows.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    let page_count = state.outputs.table.page_count();

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Orders");
        ui.separator();
        if ui
            .add_enabled(state.page > 0, egui::Button::new("◀ Prev"))
            .clicked()
        {
            state.prev_page();
        }
        if page_count == 0 {
            ui.label("No rows");
        } else {
            ui.label(format!("Page {} of {page_count}", state.page + 1));
        }
        if ui
            .add_enabled(state.page + 1 < page_count, egui::Button::new("Next ▶"))
            .clicked()
        {
            state.next_page();
        }
    });

    let rows = state.outputs.table.page(state.page);
    let columns = state.outputs.table.columns();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
        for _ in columns {
            builder = builder.column(Column::auto().at_least(60.0).resizable(true));
        }

        builder
            .header(22.0, |mut header| {
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.label(RichText::new(name).strong());
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(20.0, |mut table_row| {
                        for name in columns {
                            table_row.col(|ui: &mut Ui| {
                                ui.label(cell_text(row.get(name)));
                            });
                        }
                    });
                }
            });
    });
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_without_json_quoting() {
        assert_eq!(cell_text(Some(&Value::from("West"))), "West");
        assert_eq!(cell_text(Some(&Value::from(12.5))), "12.5");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(None), "");
    }
}
