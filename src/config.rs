use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Rows per data-table page when not configured.
pub const DEFAULT_PAGE_SIZE: u16 = 10;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive sales analytics dashboard", long_about = None)]
pub struct Cli {
    /// Sales table to load (.csv or .parquet)
    #[arg(long, default_value = "store.csv", value_hint = ValueHint::FilePath)]
    pub data: PathBuf,

    /// Rows per data-table page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: u16,

    /// Currency symbol prefixed to sales and profit figures
    #[arg(long, default_value = "₹")]
    pub currency: String,

    /// Initial window width
    #[arg(long, default_value_t = 1400.0)]
    pub width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 900.0)]
    pub height: f32,

    /// Write the unfiltered dashboard as JSON to this path and exit
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
}

/// Display settings the dashboard needs after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub page_size: usize,
    pub currency: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: usize::from(DEFAULT_PAGE_SIZE),
            currency: "₹".to_string(),
        }
    }
}

impl Cli {
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            page_size: usize::from(self.page_size),
            currency: self.currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["sales-dashboard"]).unwrap();
        assert_eq!(cli.data, PathBuf::from("store.csv"));
        assert_eq!(cli.dashboard_config(), DashboardConfig::default());
        assert!(cli.snapshot.is_none());
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "sales-dashboard",
            "--data",
            "sales.parquet",
            "--page-size",
            "25",
            "--currency",
            "$",
        ])
        .unwrap();
        let cfg = cli.dashboard_config();
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.currency, "$");
    }

    #[test]
    fn zero_page_size_rejected() {
        assert!(Cli::try_parse_from(["sales-dashboard", "--page-size", "0"]).is_err());
    }
}
