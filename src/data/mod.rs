/// Data layer: typed rows, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (day-first dates, typed amounts)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Record>, picker options, date span (read-only)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSelection → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  FilteredView → KpiBundle + ChartSpecs
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
