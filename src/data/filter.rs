use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{Dimension, Record, Table};

// ---------------------------------------------------------------------------
// Filter selection: which values are selected per dimension + date range
// ---------------------------------------------------------------------------

/// Snapshot of every filter control.
///
/// A dimension that is absent or has an empty set is unrestricted. Date
/// bounds are inclusive; an unset bound falls back to the table's span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub categorical: BTreeMap<Dimension, BTreeSet<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterSelection {
    /// Selected values for a dimension, `None` when unrestricted.
    pub fn selected(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.categorical
            .get(&dimension)
            .filter(|values| !values.is_empty())
    }

    /// Replace a dimension's selection. An empty set clears the restriction.
    pub fn set_values(&mut self, dimension: Dimension, values: BTreeSet<String>) {
        if values.is_empty() {
            self.categorical.remove(&dimension);
        } else {
            self.categorical.insert(dimension, values);
        }
    }

    /// Inclusive date bounds to test against, or `None` when no date
    /// predicate applies. A bound is `None` only when it is unset and the
    /// table has no valid dates to fall back on.
    pub fn date_bounds(&self, table: &Table) -> Option<(Option<NaiveDate>, Option<NaiveDate>)> {
        if self.start_date.is_none() && self.end_date.is_none() {
            return None;
        }
        let span = table.date_span();
        let start = self.start_date.or(span.map(|(lo, _)| lo));
        let end = self.end_date.or(span.map(|(_, hi)| hi));
        Some((start, end))
    }

    fn matches(&self, record: &Record, dates: Option<(Option<NaiveDate>, Option<NaiveDate>)>) -> bool {
        for dim in Dimension::ALL {
            if let Some(values) = self.selected(dim) {
                if !values.contains(record.dimension(dim)) {
                    return false;
                }
            }
        }
        match dates {
            None => true,
            Some((start, end)) => match record.order_date {
                // Rows without a valid date can't satisfy a range.
                None => false,
                Some(d) => start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The rows of a [`Table`] matching one [`FilterSelection`], in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }
}

/// Return the rows that pass every active filter.
///
/// A row passes when, for each restricted dimension, its value is in the
/// selected set, and, when a date predicate applies, its order date lies in
/// the inclusive range.
pub fn filter<'a>(table: &'a Table, selection: &FilterSelection) -> FilteredView<'a> {
    let dates = selection.date_bounds(table);
    let indices = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec, dates))
        .map(|(i, _)| i)
        .collect();
    FilteredView { table, indices }
}
