use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::aggregate::{aggregate, ChartSpecs, KpiBundle};
use crate::data::filter::{filter, FilterSelection};
use crate::data::model::{Dimension, Table};
use crate::view::{bind_charts, bind_rows, format_kpis, Charts, KpiStrings, TableRows};

// ---------------------------------------------------------------------------
// Named inputs and outputs
// ---------------------------------------------------------------------------

/// A filter control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputId {
    Region,
    Category,
    SubCategory,
    Segment,
    StartDate,
    EndDate,
    ShipMode,
}

impl InputId {
    pub const ALL: [InputId; 7] = [
        InputId::Region,
        InputId::Category,
        InputId::SubCategory,
        InputId::Segment,
        InputId::StartDate,
        InputId::EndDate,
        InputId::ShipMode,
    ];

    fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Region => InputId::Region,
            Dimension::Category => InputId::Category,
            Dimension::SubCategory => InputId::SubCategory,
            Dimension::Segment => InputId::Segment,
            Dimension::ShipMode => InputId::ShipMode,
        }
    }
}

/// A rendered dashboard element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputId {
    TotalSales,
    TotalProfit,
    ProfitMargin,
    TotalOrders,
    ReturnRate,
    SalesByRegion,
    ProfitByCategory,
    SalesOverTime,
    TopProducts,
    DataTable,
}

impl OutputId {
    pub const ALL: [OutputId; 10] = [
        OutputId::TotalSales,
        OutputId::TotalProfit,
        OutputId::ProfitMargin,
        OutputId::TotalOrders,
        OutputId::ReturnRate,
        OutputId::SalesByRegion,
        OutputId::ProfitByCategory,
        OutputId::SalesOverTime,
        OutputId::TopProducts,
        OutputId::DataTable,
    ];
}

/// Outputs refreshed when `input` changes. Every input drives every output.
pub fn bound_outputs(_input: InputId) -> &'static [OutputId] {
    &OutputId::ALL
}

/// A new value for one control.
#[derive(Debug, Clone, PartialEq)]
pub enum InputChange {
    Categorical(Dimension, BTreeSet<String>),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
}

impl InputChange {
    pub fn input(&self) -> InputId {
        match self {
            InputChange::Categorical(d, _) => InputId::for_dimension(*d),
            InputChange::StartDate(_) => InputId::StartDate,
            InputChange::EndDate(_) => InputId::EndDate,
        }
    }

    fn apply_to(self, selection: &mut FilterSelection) {
        match self {
            InputChange::Categorical(d, values) => selection.set_values(d, values),
            InputChange::StartDate(d) => selection.start_date = d,
            InputChange::EndDate(d) => selection.end_date = d,
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// All ten outputs of one update, plus the aggregates they were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOutputs {
    pub kpis: KpiBundle,
    pub specs: ChartSpecs,
    pub kpi_strings: KpiStrings,
    pub charts: Charts,
    pub table: TableRows,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    kpis: &'a KpiBundle,
    kpi_strings: &'a KpiStrings,
    charts: &'a ChartSpecs,
    columns: &'a [String],
    rows: &'a [serde_json::Map<String, serde_json::Value>],
}

impl DashboardOutputs {
    /// Pretty JSON of the aggregates and every table row.
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Snapshot {
            kpis: &self.kpis,
            kpi_strings: &self.kpi_strings,
            charts: &self.specs,
            columns: self.table.columns(),
            rows: self.table.rows(),
        })
    }
}

/// Filter → aggregate → bind, from scratch.
pub fn evaluate(table: &Table, selection: &FilterSelection, config: &DashboardConfig) -> DashboardOutputs {
    let view = filter(table, selection);
    let (kpis, specs) = aggregate(&view);
    DashboardOutputs {
        kpi_strings: format_kpis(&kpis, &config.currency),
        charts: bind_charts(&specs),
        table: bind_rows(&view, config.page_size),
        kpis,
        specs,
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The dashboard state, independent of rendering.
pub struct AppState {
    /// Loaded dataset, shared read-only.
    pub table: Arc<Table>,

    pub config: DashboardConfig,

    /// Current value of every filter control.
    pub selection: FilterSelection,

    /// Outputs for `selection` (recomputed on every change).
    pub outputs: DashboardOutputs,

    /// Zero-based data-table page.
    pub page: usize,
}

impl AppState {
    /// Start with no categorical filters and the full date span selected.
    pub fn new(table: Arc<Table>, config: DashboardConfig) -> Self {
        let selection = Self::initial_selection(&table);
        let outputs = evaluate(&table, &selection, &config);
        Self {
            table,
            config,
            selection,
            outputs,
            page: 0,
        }
    }

    fn initial_selection(table: &Table) -> FilterSelection {
        let span = table.date_span();
        FilterSelection {
            start_date: span.map(|(lo, _)| lo),
            end_date: span.map(|(_, hi)| hi),
            ..Default::default()
        }
    }

    /// Apply one control change and refresh every bound output.
    pub fn apply(&mut self, change: InputChange) {
        let input = change.input();
        change.apply_to(&mut self.selection);
        self.recompute();
        log::debug!(
            "{input:?} changed: {} of {} rows, refreshed {} outputs",
            self.outputs.table.total_rows(),
            self.table.len(),
            bound_outputs(input).len()
        );
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_value(&mut self, dimension: Dimension, value: &str) {
        let mut values = self
            .selection
            .selected(dimension)
            .cloned()
            .unwrap_or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        self.apply(InputChange::Categorical(dimension, values));
    }

    /// Drop a dimension's restriction.
    pub fn clear_dimension(&mut self, dimension: Dimension) {
        self.apply(InputChange::Categorical(dimension, BTreeSet::new()));
    }

    /// Back to the startup selection.
    pub fn reset_filters(&mut self) {
        self.selection = Self::initial_selection(&self.table);
        self.recompute();
        log::debug!("filters reset");
    }

    fn recompute(&mut self) {
        self.outputs = evaluate(&self.table, &self.selection, &self.config);
        self.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        let last = self.outputs.table.page_count().saturating_sub(1);
        self.page = page.min(last);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }
}
