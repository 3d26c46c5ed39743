use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::FilteredView;
use super::model::{Dimension, Record};

/// How many products the top-sellers chart keeps.
pub const TOP_PRODUCTS: usize = 10;

// ---------------------------------------------------------------------------
// Aggregate types
// ---------------------------------------------------------------------------

/// The five headline figures of a filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KpiBundle {
    pub total_sales: f64,
    pub total_profit: f64,
    /// `round(profit / sales, 2)`, or 0 when sales are 0.
    pub profit_margin: f64,
    /// Distinct order identifiers.
    pub total_orders: usize,
    /// `round(returned orders / total orders, 2)`, or 0 without orders.
    pub return_rate: f64,
}

/// One bar of a grouped sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub sales: f64,
}

/// Grouped sums behind the four charts.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartSpecs {
    pub sales_by_region: Vec<GroupTotal>,
    pub profit_by_category: Vec<GroupTotal>,
    /// Ascending by date, one entry per date.
    pub sales_over_time: Vec<DailyTotal>,
    /// At most [`TOP_PRODUCTS`] products, descending by sales.
    pub top_products: Vec<GroupTotal>,
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

/// Sum `value` per `key` over the view. Rows with no key are skipped.
fn sum_by<'a, K, F, V>(view: &FilteredView<'a>, key: F, value: V) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&'a Record) -> Option<K>,
    V: Fn(&Record) -> f64,
{
    let mut sums = BTreeMap::new();
    for rec in view.records() {
        if let Some(k) = key(rec) {
            *sums.entry(k).or_insert(0.0) += value(rec);
        }
    }
    sums
}

fn group_totals(sums: BTreeMap<&str, f64>) -> Vec<GroupTotal> {
    sums.into_iter()
        .map(|(label, value)| GroupTotal {
            label: label.to_string(),
            value,
        })
        .collect()
}

/// Two decimals, rounding the exact binary value with ties to even.
pub fn round2(x: f64) -> f64 {
    format!("{x:.2}").parse().unwrap_or(x)
}

/// Headline figures for a view.
pub fn kpis(view: &FilteredView<'_>) -> KpiBundle {
    let mut total_sales = 0.0;
    let mut total_profit = 0.0;
    let mut orders: HashSet<&str> = HashSet::new();
    let mut returned: HashSet<&str> = HashSet::new();

    for rec in view.records() {
        total_sales += rec.sales;
        total_profit += rec.profit;
        orders.insert(&rec.order_id);
        if rec.returns.is_returned() {
            returned.insert(&rec.order_id);
        }
    }

    let total_orders = orders.len();
    let profit_margin = if total_sales != 0.0 {
        round2(total_profit / total_sales)
    } else {
        0.0
    };
    let return_rate = if total_orders != 0 {
        round2(returned.len() as f64 / total_orders as f64)
    } else {
        0.0
    };

    KpiBundle {
        total_sales,
        total_profit,
        profit_margin,
        total_orders,
        return_rate,
    }
}

/// Grouped sums for the four charts.
pub fn chart_specs(view: &FilteredView<'_>) -> ChartSpecs {
    let sales_by_region = group_totals(sum_by(
        view,
        |r| Some(r.dimension(Dimension::Region)),
        |r| r.sales,
    ));
    let profit_by_category = group_totals(sum_by(
        view,
        |r| Some(r.dimension(Dimension::Category)),
        |r| r.profit,
    ));
    let sales_over_time = sum_by(view, |r| r.order_date, |r| r.sales)
        .into_iter()
        .map(|(date, sales)| DailyTotal { date, sales })
        .collect();

    // Stable sort keeps ties in name order.
    let mut top_products = group_totals(sum_by(view, |r| Some(r.product_name.as_str()), |r| r.sales));
    top_products.sort_by(|a, b| b.value.total_cmp(&a.value));
    top_products.truncate(TOP_PRODUCTS);

    ChartSpecs {
        sales_by_region,
        profit_by_category,
        sales_over_time,
        top_products,
    }
}

/// Everything the dashboard derives from a view.
pub fn aggregate(view: &FilteredView<'_>) -> (KpiBundle, ChartSpecs) {
    (kpis(view), chart_specs(view))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::{filter, FilterSelection};
    use crate::data::model::{ReturnFlag, Table};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(
        id: &str,
        region: &str,
        category: &str,
        product: &str,
        date: Option<NaiveDate>,
        sales: f64,
        profit: f64,
        returned: bool,
    ) -> Record {
        Record {
            order_id: id.into(),
            region: region.into(),
            category: category.into(),
            product_name: product.into(),
            order_date: date,
            sales,
            profit,
            returns: if returned {
                ReturnFlag::Returned
            } else {
                ReturnFlag::NotReturned
            },
            ..Default::default()
        }
    }

    fn table() -> Table {
        Table::from_records(vec![
            rec("O1", "West", "Furniture", "Chair", Some(ymd(2016, 1, 2)), 100.0, 20.0, true),
            rec("O1", "West", "Technology", "Phone", Some(ymd(2016, 1, 2)), 300.0, 60.0, true),
            rec("O2", "East", "Furniture", "Desk", Some(ymd(2016, 1, 1)), 250.0, -50.0, false),
            rec("O3", "West", "Office Supplies", "Paper", None, 50.0, 5.0, false),
            rec("O4", "South", "Technology", "Phone", Some(ymd(2016, 1, 3)), 100.0, 15.0, false),
        ])
    }

    #[test]
    fn unfiltered_kpis_match_column_sums() {
        let t = table();
        let view = filter(&t, &FilterSelection::default());
        let k = kpis(&view);
        let sales: f64 = t.records().iter().map(|r| r.sales).sum();
        let profit: f64 = t.records().iter().map(|r| r.profit).sum();
        assert_eq!(k.total_sales, sales);
        assert_eq!(k.total_profit, profit);
        assert_eq!(k.total_orders, 4);
        assert_eq!(k.profit_margin, round2(50.0 / 800.0));
        // 1 of 4 distinct orders returned
        assert_eq!(k.return_rate, 0.25);
    }

    #[test]
    fn region_filter_sums_only_matching_rows() {
        let t = table();
        let mut sel = FilterSelection::default();
        sel.set_values(Dimension::Region, BTreeSet::from(["West".to_string()]));
        let k = kpis(&filter(&t, &sel));
        assert_eq!(k.total_sales, 450.0);
        assert_eq!(k.total_orders, 2);
        assert_eq!(k.return_rate, 0.5);
    }

    #[test]
    fn empty_view_yields_zeroes() {
        let t = table();
        let mut sel = FilterSelection::default();
        sel.set_values(Dimension::Region, BTreeSet::from(["North".to_string()]));
        let view = filter(&t, &sel);
        let (k, specs) = aggregate(&view);
        assert_eq!(k, KpiBundle::default());
        assert_eq!(specs, ChartSpecs::default());
    }

    #[test]
    fn zero_sales_margin_is_zero() {
        let t = Table::from_records(vec![rec("O1", "West", "F", "P", None, 0.0, 5.0, false)]);
        let k = kpis(&filter(&t, &FilterSelection::default()));
        assert_eq!(k.profit_margin, 0.0);
        assert_eq!(k.total_orders, 1);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(0.0625), 0.06);
    }

    #[test]
    fn one_returned_order_in_eight() {
        let records: Vec<Record> = (0..8)
            .map(|i| rec(&format!("O{i}"), "West", "F", "P", None, 10.0, 1.0, i == 0))
            .collect();
        let t = Table::from_records(records);
        let k = kpis(&filter(&t, &FilterSelection::default()));
        assert_eq!(k.total_orders, 8);
        assert_eq!(k.return_rate, 0.12);
    }

    #[test]
    fn return_rate_stays_in_unit_interval() {
        let t = table();
        let k = kpis(&filter(&t, &FilterSelection::default()));
        assert!((0.0..=1.0).contains(&k.return_rate));
    }

    #[test]
    fn grouped_sums() {
        let t = table();
        let specs = chart_specs(&filter(&t, &FilterSelection::default()));

        let regions: Vec<(&str, f64)> = specs
            .sales_by_region
            .iter()
            .map(|g| (g.label.as_str(), g.value))
            .collect();
        assert_eq!(regions, vec![("East", 250.0), ("South", 100.0), ("West", 450.0)]);

        let furniture = specs
            .profit_by_category
            .iter()
            .find(|g| g.label == "Furniture")
            .unwrap();
        assert_eq!(furniture.value, -30.0);
    }

    #[test]
    fn sales_over_time_is_strictly_ascending_and_skips_missing_dates() {
        let t = table();
        let specs = chart_specs(&filter(&t, &FilterSelection::default()));
        let dates: Vec<NaiveDate> = specs.sales_over_time.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![ymd(2016, 1, 1), ymd(2016, 1, 2), ymd(2016, 1, 3)]);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(specs.sales_over_time[1].sales, 400.0);
    }

    #[test]
    fn top_products_descending_and_capped() {
        let records: Vec<Record> = (0..15)
            .map(|i| {
                rec(
                    &format!("O{i}"),
                    "West",
                    "F",
                    &format!("Product {i:02}"),
                    None,
                    i as f64 * 10.0,
                    0.0,
                    false,
                )
            })
            .collect();
        let t = Table::from_records(records);
        let specs = chart_specs(&filter(&t, &FilterSelection::default()));

        assert_eq!(specs.top_products.len(), TOP_PRODUCTS);
        assert_eq!(specs.top_products[0].label, "Product 14");
        assert!(specs
            .top_products
            .windows(2)
            .all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn top_products_sum_across_rows() {
        let t = table();
        let specs = chart_specs(&filter(&t, &FilterSelection::default()));
        assert_eq!(specs.top_products[0].label, "Phone");
        assert_eq!(specs.top_products[0].value, 400.0);
    }
}
