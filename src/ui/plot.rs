use chrono::NaiveDate;
use eframe::egui::{RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};

use crate::view::{ChartArtifact, ChartKind, Charts};

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

/// Render the four charts two per row.
pub fn chart_grid(ui: &mut Ui, charts: &Charts) {
    let [a, b, c, d] = charts.as_array();
    for (id, (left, right)) in [(a, b), (c, d)].into_iter().enumerate() {
        ui.columns(2, |cols: &mut [Ui]| {
            chart(&mut cols[0], left, id * 2);
            chart(&mut cols[1], right, id * 2 + 1);
        });
        ui.add_space(8.0);
    }
}

/// Render one chart artifact.
pub fn chart(ui: &mut Ui, artifact: &ChartArtifact, index: usize) {
    ui.strong(artifact.title);
    if artifact.points.is_empty() {
        ui.label(RichText::new("No data for the current filters").weak());
    }

    let plot = Plot::new(("dashboard_chart", index))
        .height(CHART_HEIGHT)
        .x_axis_label(artifact.x_label)
        .y_axis_label(artifact.y_label)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false);

    // Formatters own their labels.
    let labels = artifact.clone();
    match artifact.kind {
        ChartKind::Bar => {
            plot.x_axis_formatter(move |mark: GridMark, _| label_for(&labels, mark))
                .show(ui, |plot_ui| plot_ui.bar_chart(bar_chart(artifact)));
        }
        ChartKind::HorizontalBar => {
            plot.y_axis_formatter(move |mark: GridMark, _| label_for(&labels, mark))
                .show(ui, |plot_ui| plot_ui.bar_chart(bar_chart(artifact).horizontal()));
        }
        ChartKind::Line => {
            plot.x_axis_formatter(|mark: GridMark, _| date_label(mark.value))
                .show(ui, |plot_ui| {
                    let coords: Vec<[f64; 2]> = artifact
                        .points
                        .iter()
                        .map(|p| [p.position, p.value])
                        .collect();
                    let color = artifact.points.first().map(|p| p.color);

                    let mut line = Line::new(PlotPoints::from(coords.clone())).width(2.0);
                    let mut markers = Points::new(PlotPoints::from(coords)).radius(3.0);
                    if let Some(c) = color {
                        line = line.color(c);
                        markers = markers.color(c);
                    }
                    plot_ui.line(line);
                    plot_ui.points(markers);
                });
        }
    }
}

fn bar_chart(artifact: &ChartArtifact) -> BarChart {
    let bars = artifact
        .points
        .iter()
        .map(|p| {
            Bar::new(p.position, p.value)
                .name(&p.hover)
                .fill(p.color)
                .width(0.7)
        })
        .collect();
    BarChart::new(bars)
}

/// Category label for integer grid marks only.
fn label_for(artifact: &ChartArtifact, mark: GridMark) -> String {
    artifact
        .label_at(mark.value)
        .map(str::to_string)
        .unwrap_or_default()
}

fn date_label(days_from_ce: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(days_from_ce.round() as i32)
        .map(|d| d.format("%d-%m-%Y").to_string())
        .unwrap_or_default()
}
