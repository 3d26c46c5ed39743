//! Turns aggregates into things the UI can draw: KPI strings, chart
//! artifacts and paginated table rows. Nothing here recomputes an aggregate.

use chrono::Datelike;
use eframe::egui::Color32;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::color::{generate_palette, BlueScale};
use crate::data::aggregate::{ChartSpecs, GroupTotal, KpiBundle};
use crate::data::filter::FilteredView;

/// Longest product name shown on the top-sellers axis before eliding.
pub const SHORT_NAME_LEN: usize = 25;

const LINE_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

// ---------------------------------------------------------------------------
// KPI strings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KpiStrings {
    pub total_sales: String,
    pub total_profit: String,
    pub profit_margin: String,
    pub total_orders: String,
    pub return_rate: String,
}

impl KpiStrings {
    /// In display order.
    pub fn as_array(&self) -> [&str; 5] {
        [
            &self.total_sales,
            &self.total_profit,
            &self.profit_margin,
            &self.total_orders,
            &self.return_rate,
        ]
    }
}

pub fn format_kpis(kpis: &KpiBundle, currency: &str) -> KpiStrings {
    KpiStrings {
        total_sales: format!("Total Sales: {}", format_currency(kpis.total_sales, currency)),
        total_profit: format!("Total Profit: {}", format_currency(kpis.total_profit, currency)),
        profit_margin: format!("Profit Margin: {}", format_percent(kpis.profit_margin)),
        total_orders: format!("Total Orders: {}", kpis.total_orders),
        return_rate: format!("Return Rate: {}", format_percent(kpis.return_rate)),
    }
}

/// Whole currency units with thousands separators, e.g. `₹-12,346`.
/// Exact halves round to even.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let digits = format!("{:.0}", value.abs());
    // No sign on a value that rounds to zero.
    let sign = if value < 0.0 && digits != "0" { "-" } else { "" };
    format!("{symbol}{sign}{}", group_thousands(&digits))
}

/// A ratio as a percentage with one decimal, e.g. `0.12` → `12.0%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn group_thousands(int_part: &str) -> String {
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        let pos_from_end = len - i;
        out.push(ch);
        if pos_from_end > 1 && pos_from_end % 3 == 1 {
            out.push(',');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Chart artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Vertical bars, one per category.
    Bar,
    /// Connected line with point markers.
    Line,
    /// Horizontal bars; `position` is the row on the value axis' cross axis.
    HorizontalBar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Argument-axis coordinate: category index, or days since CE for dates.
    pub position: f64,
    /// Axis label at `position`.
    pub label: String,
    /// Hover text.
    pub hover: String,
    pub value: f64,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub title: &'static str,
    pub kind: ChartKind,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ChartPoint>,
}

impl ChartArtifact {
    /// Axis label for a grid mark, if one sits there.
    pub fn label_at(&self, position: f64) -> Option<&str> {
        self.points
            .iter()
            .find(|p| (p.position - position).abs() < 1e-6)
            .map(|p| p.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Charts {
    pub sales_by_region: ChartArtifact,
    pub profit_by_category: ChartArtifact,
    pub sales_over_time: ChartArtifact,
    pub top_products: ChartArtifact,
}

impl Charts {
    pub fn as_array(&self) -> [&ChartArtifact; 4] {
        [
            &self.sales_by_region,
            &self.profit_by_category,
            &self.sales_over_time,
            &self.top_products,
        ]
    }
}

/// First [`SHORT_NAME_LEN`] characters plus `...` for long names.
pub fn short_product_name(name: &str) -> String {
    if name.chars().count() > SHORT_NAME_LEN {
        let head: String = name.chars().take(SHORT_NAME_LEN).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

fn categorical_bars(
    title: &'static str,
    x_label: &'static str,
    y_label: &'static str,
    groups: &[GroupTotal],
) -> ChartArtifact {
    let palette = generate_palette(groups.len());
    let points = groups
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, (g, color))| ChartPoint {
            position: i as f64,
            label: g.label.clone(),
            hover: format!("{}: {:.2}", g.label, g.value),
            value: g.value,
            color,
        })
        .collect();
    ChartArtifact {
        title,
        kind: ChartKind::Bar,
        x_label,
        y_label,
        points,
    }
}

pub fn bind_charts(specs: &ChartSpecs) -> Charts {
    let sales_over_time = ChartArtifact {
        title: "Sales Over Time",
        kind: ChartKind::Line,
        x_label: "Order Date",
        y_label: "Sales",
        points: specs
            .sales_over_time
            .iter()
            .map(|d| {
                let label = d.date.format("%d-%m-%Y").to_string();
                ChartPoint {
                    position: f64::from(d.date.num_days_from_ce()),
                    hover: format!("{label}: {:.2}", d.sales),
                    label,
                    value: d.sales,
                    color: LINE_COLOR,
                }
            })
            .collect(),
    };

    // Chosen by descending sales, drawn ascending so the largest sits on top.
    let scale = BlueScale::spanning(specs.top_products.iter().map(|p| p.value));
    let top_products = ChartArtifact {
        title: "Top 10 Products by Sales",
        kind: ChartKind::HorizontalBar,
        x_label: "Sales",
        y_label: "",
        points: specs
            .top_products
            .iter()
            .rev()
            .enumerate()
            .map(|(i, p)| ChartPoint {
                position: i as f64,
                label: short_product_name(&p.label),
                hover: format!("{}: {:.2}", p.label, p.value),
                value: p.value,
                color: scale.color_for(p.value),
            })
            .collect(),
    };

    Charts {
        sales_by_region: categorical_bars(
            "Sales by Region",
            "Region",
            "Sales",
            &specs.sales_by_region,
        ),
        profit_by_category: categorical_bars(
            "Profit by Category",
            "Category",
            "Profit",
            &specs.profit_by_category,
        ),
        sales_over_time,
        top_products,
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Every row of a filtered view as JSON records, served a page at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRows {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
    page_size: usize,
}

impl TableRows {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero when there are no rows.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size)
    }

    /// Rows on page `page` (zero-based). Empty past the last page.
    pub fn page(&self, page: usize) -> &[Map<String, Value>] {
        let start = page.saturating_mul(self.page_size).min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

pub fn bind_rows(view: &FilteredView<'_>, page_size: usize) -> TableRows {
    let columns = view.table().columns().to_vec();
    let rows = view.records().map(|r| r.to_json(&columns)).collect();
    TableRows {
        columns,
        rows,
        page_size: page_size.max(1),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::aggregate::DailyTotal;
    use crate::data::filter::{filter, FilterSelection};
    use crate::data::model::{Record, Table};

    #[test]
    fn currency_has_thousands_separators() {
        assert_eq!(format_currency(2297200.8603, "₹"), "₹2,297,201");
        assert_eq!(format_currency(999.4, "$"), "$999");
        assert_eq!(format_currency(1000.0, "$"), "$1,000");
        assert_eq!(format_currency(-12345.6, "$"), "$-12,346");
        assert_eq!(format_currency(-0.2, "$"), "$0");
        assert_eq!(format_currency(0.0, ""), "0");
    }

    #[test]
    fn currency_halves_round_to_even() {
        assert_eq!(format_currency(2.5, "$"), "$2");
        assert_eq!(format_currency(3.5, "$"), "$4");
        assert_eq!(format_currency(-0.5, "$"), "$0");
        assert_eq!(format_currency(1234.5, "$"), "$1,234");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(0.12), "12.0%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(-0.05), "-5.0%");
    }

    #[test]
    fn kpi_strings() {
        let k = KpiBundle {
            total_sales: 1234.5,
            total_profit: -50.0,
            profit_margin: -0.04,
            total_orders: 12,
            return_rate: 0.25,
        };
        let s = format_kpis(&k, "$");
        assert_eq!(
            s.as_array(),
            [
                "Total Sales: $1,234",
                "Total Profit: $-50",
                "Profit Margin: -4.0%",
                "Total Orders: 12",
                "Return Rate: 25.0%",
            ]
        );
    }

    #[test]
    fn long_names_are_elided_for_display_only() {
        let long = "Canon imageCLASS 2200 Advanced Copier";
        assert_eq!(short_product_name(long), "Canon imageCLASS 2200 Adv...");
        assert_eq!(short_product_name("Phone"), "Phone");
        assert_eq!(short_product_name(&"x".repeat(25)), "x".repeat(25));

        let specs = ChartSpecs {
            top_products: vec![
                GroupTotal { label: long.into(), value: 300.0 },
                GroupTotal { label: "Phone".into(), value: 100.0 },
            ],
            ..Default::default()
        };
        let charts = bind_charts(&specs);
        let top = &charts.top_products.points;
        // Rendered ascending: smallest first, largest on top.
        assert_eq!(top[0].label, "Phone");
        assert_eq!(top[1].label, "Canon imageCLASS 2200 Adv...");
        assert_eq!(top[1].value, 300.0);
        assert!(top[1].hover.starts_with(long));
        assert!(top.windows(2).all(|w| w[0].value <= w[1].value));
    }

    #[test]
    fn charts_keep_aggregate_order() {
        let d1 = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2016, 1, 2).unwrap();
        let specs = ChartSpecs {
            sales_by_region: vec![
                GroupTotal { label: "East".into(), value: 1.0 },
                GroupTotal { label: "West".into(), value: 2.0 },
            ],
            sales_over_time: vec![
                DailyTotal { date: d1, sales: 5.0 },
                DailyTotal { date: d2, sales: 7.0 },
            ],
            ..Default::default()
        };
        let charts = bind_charts(&specs);

        assert_eq!(charts.sales_by_region.kind, ChartKind::Bar);
        assert_eq!(charts.sales_by_region.label_at(1.0), Some("West"));
        assert_ne!(
            charts.sales_by_region.points[0].color,
            charts.sales_by_region.points[1].color
        );
        assert!(charts.profit_by_category.points.is_empty());

        let line = &charts.sales_over_time;
        assert_eq!(line.kind, ChartKind::Line);
        assert_eq!(line.points[1].position - line.points[0].position, 1.0);
        assert_eq!(line.points[0].label, "01-01-2016");
    }

    #[test]
    fn rows_paginate() {
        let records: Vec<Record> = (0..23)
            .map(|i| Record {
                order_id: format!("O{i}"),
                ..Default::default()
            })
            .collect();
        let table = Table::from_records(records);
        let rows = bind_rows(&filter(&table, &FilterSelection::default()), 10);

        assert_eq!(rows.total_rows(), 23);
        assert_eq!(rows.page_count(), 3);
        assert_eq!(rows.page(0).len(), 10);
        assert_eq!(rows.page(2).len(), 3);
        assert_eq!(rows.page(2)[0]["Order ID"], "O20");
        assert!(rows.page(3).is_empty());
        assert!(rows.page(usize::MAX).is_empty());
    }

    #[test]
    fn empty_view_has_no_pages() {
        let table = Table::from_records(Vec::new());
        let rows = bind_rows(&filter(&table, &FilterSelection::default()), 10);
        assert_eq!(rows.page_count(), 0);
        assert!(rows.page(0).is_empty());
    }
}
