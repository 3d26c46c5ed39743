use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Dimension – the categorical columns a user can filter on
// ---------------------------------------------------------------------------

/// A categorical column exposed as a multi-select filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Region,
    Category,
    SubCategory,
    Segment,
    ShipMode,
}

impl Dimension {
    /// All filterable dimensions, in the order the filter panel shows them.
    pub const ALL: [Dimension; 5] = [
        Dimension::Region,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::Segment,
        Dimension::ShipMode,
    ];

    /// Header of the source column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Region => "Region",
            Dimension::Category => "Category",
            Dimension::SubCategory => "Sub-Category",
            Dimension::Segment => "Segment",
            Dimension::ShipMode => "Ship Mode",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// ReturnFlag
// ---------------------------------------------------------------------------

/// Whether the order line was returned.
///
/// Only the exact literal `Yes` (surrounding whitespace ignored, case-sensitive)
/// marks a return. Anything else, including an empty cell, is `NotReturned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnFlag {
    Returned,
    #[default]
    NotReturned,
}

impl ReturnFlag {
    pub const RETURNED_LITERAL: &'static str = "Yes";

    pub fn parse(cell: &str) -> Self {
        if cell.trim() == Self::RETURNED_LITERAL {
            ReturnFlag::Returned
        } else {
            ReturnFlag::NotReturned
        }
    }

    pub fn is_returned(self) -> bool {
        self == ReturnFlag::Returned
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReturnFlag::Returned => Self::RETURNED_LITERAL,
            ReturnFlag::NotReturned => "No",
        }
    }
}

// ---------------------------------------------------------------------------
// Column – source headers with a typed meaning
// ---------------------------------------------------------------------------

/// Source columns the dashboard understands. Any other header is carried
/// through as an extra text cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    OrderId,
    OrderDate,
    Dimension(Dimension),
    Sales,
    Profit,
    Returns,
    ProductName,
}

impl Column {
    /// Every modelled column; all of them must be present in the source.
    pub const REQUIRED: [Column; 11] = [
        Column::OrderId,
        Column::OrderDate,
        Column::Dimension(Dimension::Region),
        Column::Dimension(Dimension::Category),
        Column::Dimension(Dimension::SubCategory),
        Column::Dimension(Dimension::Segment),
        Column::Dimension(Dimension::ShipMode),
        Column::Sales,
        Column::Profit,
        Column::Returns,
        Column::ProductName,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::OrderId => "Order ID",
            Column::OrderDate => "Order Date",
            Column::Dimension(d) => d.column(),
            Column::Sales => "Sales",
            Column::Profit => "Profit",
            Column::Returns => "returns",
            Column::ProductName => "Product Name",
        }
    }

    /// Resolve a source header. The returns column is matched
    /// case-insensitively, everything else exactly.
    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        if header.eq_ignore_ascii_case("returns") {
            return Some(Column::Returns);
        }
        Column::REQUIRED
            .into_iter()
            .find(|c| *c != Column::Returns && c.header() == header)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub order_id: String,
    /// `None` when the source value could not be parsed as a day-first date.
    pub order_date: Option<NaiveDate>,
    pub region: String,
    pub category: String,
    pub sub_category: String,
    pub segment: String,
    pub ship_mode: String,
    pub sales: f64,
    pub profit: f64,
    pub returns: ReturnFlag,
    pub product_name: String,
    /// Source columns without a typed meaning: header → raw text.
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// Value of a categorical dimension.
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Region => &self.region,
            Dimension::Category => &self.category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::Segment => &self.segment,
            Dimension::ShipMode => &self.ship_mode,
        }
    }

    fn dimension_mut(&mut self, dimension: Dimension) -> &mut String {
        match dimension {
            Dimension::Region => &mut self.region,
            Dimension::Category => &mut self.category,
            Dimension::SubCategory => &mut self.sub_category,
            Dimension::Segment => &mut self.segment,
            Dimension::ShipMode => &mut self.ship_mode,
        }
    }

    /// Store a text cell for a modelled column. Numeric and date columns are
    /// parsed by the loader and must go through their typed fields instead.
    pub(crate) fn set_text(&mut self, column: Column, value: &str) {
        match column {
            Column::OrderId => self.order_id = value.to_string(),
            Column::Dimension(d) => *self.dimension_mut(d) = value.to_string(),
            Column::Returns => self.returns = ReturnFlag::parse(value),
            Column::ProductName => self.product_name = value.to_string(),
            Column::OrderDate | Column::Sales | Column::Profit => {}
        }
    }

    /// JSON value of the cell under `header`, as shown in the data table.
    pub fn cell(&self, header: &str) -> Value {
        match Column::from_header(header) {
            Some(Column::OrderId) => Value::from(self.order_id.as_str()),
            Some(Column::OrderDate) => self
                .order_date
                .map(|d| Value::from(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
            Some(Column::Dimension(d)) => Value::from(self.dimension(d)),
            Some(Column::Sales) => number(self.sales),
            Some(Column::Profit) => number(self.profit),
            Some(Column::Returns) => Value::from(self.returns.as_str()),
            Some(Column::ProductName) => Value::from(self.product_name.as_str()),
            None => self
                .extra
                .get(header)
                .map(|s| Value::from(s.as_str()))
                .unwrap_or(Value::Null),
        }
    }

    /// Serialise the row as a record keyed by `columns`, in that order.
    pub fn to_json(&self, columns: &[String]) -> Map<String, Value> {
        columns
            .iter()
            .map(|col| (col.clone(), self.cell(col)))
            .collect()
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The loaded dataset. Immutable once built; filters only ever derive
/// index views over it.
#[derive(Debug, Clone, Default)]
pub struct Table {
    records: Vec<Record>,
    /// Source headers in file order.
    columns: Vec<String>,
    /// Sorted distinct values per dimension, for the filter pickers.
    options: BTreeMap<Dimension, BTreeSet<String>>,
    /// Earliest and latest valid order date.
    date_span: Option<(NaiveDate, NaiveDate)>,
}

impl Table {
    /// Build the table and its column indices.
    pub fn new(records: Vec<Record>, columns: Vec<String>) -> Self {
        let mut options: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        let mut date_span: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            for dim in Dimension::ALL {
                options
                    .entry(dim)
                    .or_default()
                    .insert(rec.dimension(dim).to_string());
            }
            if let Some(d) = rec.order_date {
                date_span = Some(match date_span {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        Table {
            records,
            columns,
            options,
            date_span,
        }
    }

    /// Build a table whose headers are just the modelled columns.
    pub fn from_records(records: Vec<Record>) -> Self {
        let columns = Column::REQUIRED
            .iter()
            .map(|c| c.header().to_string())
            .collect();
        Table::new(records, columns)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct values for a dimension (empty for an empty table).
    pub fn options(&self, dimension: Dimension) -> impl Iterator<Item = &str> {
        self.options
            .get(&dimension)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_span
    }

    /// Number of rows whose order date could not be parsed.
    pub fn missing_dates(&self) -> usize {
        self.records.iter().filter(|r| r.order_date.is_none()).count()
    }
}
