use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{Column, Record, Table};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("required column '{0}' not found")]
    MissingColumn(&'static str),
    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – delimited text with a header row (recommended)
/// * `.parquet`      – same column names; `Order Date` as text or `Date32`
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            load_csv(file)?
        }
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    };

    let missing = table.missing_dates();
    if missing > 0 {
        log::warn!("{missing} rows have an unparseable Order Date");
    }
    log::info!(
        "Loaded {} rows with columns {:?}, order dates {:?}",
        table.len(),
        table.columns(),
        table.date_span()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Positions of the modelled columns plus the pass-through extras.
struct ResolvedColumns {
    modelled: Vec<(usize, Column)>,
    extra: Vec<(usize, String)>,
}

fn resolve_columns(headers: &[String]) -> Result<ResolvedColumns, LoadError> {
    let mut modelled = Vec::new();
    let mut extra = Vec::new();
    for (idx, h) in headers.iter().enumerate() {
        match Column::from_header(h) {
            Some(col) => modelled.push((idx, col)),
            None => extra.push((idx, h.clone())),
        }
    }
    for required in Column::REQUIRED {
        if !modelled.iter().any(|(_, c)| *c == required) {
            return Err(LoadError::MissingColumn(required.header()));
        }
    }
    Ok(ResolvedColumns { modelled, extra })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read a comma-delimited table with a header row.
pub fn load_csv<R: Read>(source: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let resolved = resolve_columns(&headers)?;

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut rec = Record::default();
        for &(idx, col) in &resolved.modelled {
            let cell = row.get(idx).unwrap_or("");
            match col {
                Column::OrderDate => rec.order_date = parse_day_first(cell),
                Column::Sales => rec.sales = parse_amount(cell, row_no, col)?,
                Column::Profit => rec.profit = parse_amount(cell, row_no, col)?,
                other => rec.set_text(other, cell),
            }
        }
        for (idx, name) in &resolved.extra {
            rec.extra
                .insert(name.clone(), row.get(*idx).unwrap_or("").to_string());
        }
        records.push(rec);
    }

    Ok(Table::new(records, headers))
}

fn parse_amount(cell: &str, row: usize, column: Column) -> Result<f64, LoadError> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        row,
        column: column.header(),
        value: s.to_string(),
    })
}

/// Day-first layouts, two-digit years before four-digit ones. Year-first ISO
/// dates come last.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
    "%Y-%m-%d", "%Y/%m/%d",
];

/// Tried only when no day-first reading is a valid date.
const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%y", "%m-%d-%y", "%m.%d.%y",
    "%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y",
];

/// Parse a day-first date such as `08/11/2016` (8 November 2016).
///
/// Accepts `/`, `-` or `.` separators, two- or four-digit years, and ISO
/// `YYYY-MM-DD`. A trailing time component is ignored. When the day-first
/// reading is not a valid date but the month-first one is (`01/13/2016`), the
/// latter is used. Returns `None` for anything else.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    DAY_FIRST_FORMATS
        .iter()
        .chain(MONTH_FIRST_FORMATS)
        .filter_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        // `%Y` also takes one to three digits.
        .find(|date| date.year() >= 1000)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same column names as the CSV layout.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let resolved = resolve_columns(&headers)?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let row_no = records.len() + 1;
            let mut rec = Record::default();

            for &(idx, col) in &resolved.modelled {
                let array = batch.column(idx);
                match col {
                    Column::OrderDate => rec.order_date = extract_date(array, row)?,
                    Column::Sales => rec.sales = extract_amount(array, row, row_no, col)?,
                    Column::Profit => rec.profit = extract_amount(array, row, row_no, col)?,
                    other => rec.set_text(other, &extract_text(array, row)?),
                }
            }
            for (idx, name) in &resolved.extra {
                rec.extra
                    .insert(name.clone(), extract_text(batch.column(*idx), row)?);
            }
            records.push(rec);
        }
    }

    Ok(Table::new(records, headers))
}

// -- Arrow helpers --

fn extract_text(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    array_value_to_string(col.as_ref(), row).context("formatting parquet cell")
}

fn extract_date(col: &ArrayRef, row: usize) -> Result<Option<NaiveDate>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.as_any().downcast_ref::<Date32Array>() {
        Some(dates) => Ok(dates.value_as_date(row)),
        None => Ok(parse_day_first(&extract_text(col, row)?)),
    }
}

fn extract_amount(col: &ArrayRef, row: usize, row_no: usize, column: Column) -> Result<f64> {
    if col.is_null(row) {
        return Ok(0.0);
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as f64),
        _ => None,
    };
    match value {
        Some(v) => Ok(v),
        None => Ok(parse_amount(&extract_text(col, row)?, row_no, column)?),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::StringArray;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::{Dimension, ReturnFlag};

    const HEADER: &str = "Row ID,Order ID,Order Date,Ship Mode,Segment,City,Region,Category,Sub-Category,Product Name,Sales,Profit,returns";

    fn csv(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_first_formats() {
        assert_eq!(parse_day_first("08/11/2016"), Some(ymd(2016, 11, 8)));
        assert_eq!(parse_day_first("8-11-2016"), Some(ymd(2016, 11, 8)));
        assert_eq!(parse_day_first("08.11.16"), Some(ymd(2016, 11, 8)));
        assert_eq!(parse_day_first("2016-11-08"), Some(ymd(2016, 11, 8)));
        assert_eq!(parse_day_first("08/11/2016 00:00:00"), Some(ymd(2016, 11, 8)));
        assert_eq!(parse_day_first("01/13/2016"), Some(ymd(2016, 1, 13)));
    }

    #[test]
    fn garbage_dates_become_none() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("not a date"), None);
        assert_eq!(parse_day_first("32/13/2016"), None);
        assert_eq!(parse_day_first("1/2"), None);
        assert_eq!(parse_day_first("32-01-16"), None);
    }

    #[test]
    fn two_digit_years_pivot_at_seventy() {
        assert_eq!(parse_day_first("01/02/69"), Some(ymd(2069, 2, 1)));
        assert_eq!(parse_day_first("01/02/70"), Some(ymd(1970, 2, 1)));
        assert_eq!(parse_day_first("8/13/16"), Some(ymd(2016, 8, 13)));
    }

    #[test]
    fn csv_rows_are_typed_and_extras_kept() {
        let data = csv(&[
            "1,CA-2016-152156,08/11/2016,Second Class,Consumer,Henderson,South,Furniture,Bookcases,Bush Somerset Collection Bookcase,261.96,41.9136,Yes",
            "2,CA-2016-152157,bogus,Standard Class,Corporate,Los Angeles,West,Office Supplies,Labels,Self-Adhesive Address Labels,14.62,-6.87,No",
        ]);
        let table = load_csv(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), 13);
        let first = &table.records()[0];
        assert_eq!(first.order_id, "CA-2016-152156");
        assert_eq!(first.order_date, Some(ymd(2016, 11, 8)));
        assert_eq!(first.dimension(Dimension::ShipMode), "Second Class");
        assert_eq!(first.returns, ReturnFlag::Returned);
        assert_eq!(first.extra.get("City").map(String::as_str), Some("Henderson"));
        assert!((first.sales - 261.96).abs() < 1e-9);

        let second = &table.records()[1];
        assert_eq!(second.order_date, None);
        assert!((second.profit + 6.87).abs() < 1e-9);
        assert_eq!(table.missing_dates(), 1);
    }

    #[test]
    fn empty_amount_counts_as_zero() {
        let data = csv(&["1,A,01/01/2016,X,Y,Z,West,C,S,P,,,No"]);
        let table = load_csv(data.as_bytes()).unwrap();
        assert_eq!(table.records()[0].sales, 0.0);
    }

    #[test]
    fn bad_amount_is_fatal() {
        let data = csv(&["1,A,01/01/2016,X,Y,Z,West,C,S,P,abc,1,No"]);
        let err = load_csv(data.as_bytes()).unwrap_err();
        let load = err.downcast_ref::<LoadError>().unwrap();
        assert!(matches!(
            load,
            LoadError::InvalidNumber { row: 1, column: "Sales", .. }
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        let data = "Order ID,Order Date,Region\nA,01/01/2016,West";
        let err = load_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn missing_file_fails() {
        let err = load_file(Path::new("/definitely/not/here/store.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("opening"));
    }

    #[test]
    fn unsupported_extension_fails() {
        let err = load_file(Path::new("store.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn parquet_round_trip_through_file() {
        let text_cols = [
            ("Order ID", vec!["A", "B"]),
            ("Order Date", vec!["08/11/2016", "12/06/2016"]),
            ("Region", vec!["West", "East"]),
            ("Category", vec!["Furniture", "Technology"]),
            ("Sub-Category", vec!["Chairs", "Phones"]),
            ("Segment", vec!["Consumer", "Corporate"]),
            ("Ship Mode", vec!["First Class", "Same Day"]),
            ("Product Name", vec!["Chair", "Phone"]),
            ("returns", vec!["Yes", "No"]),
        ];
        let mut fields: Vec<Field> = text_cols
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Utf8, false))
            .collect();
        fields.push(Field::new("Sales", DataType::Float64, false));
        fields.push(Field::new("Profit", DataType::Float64, false));
        let schema = Arc::new(Schema::new(fields));

        let mut arrays: Vec<ArrayRef> = text_cols
            .iter()
            .map(|(_, vals)| Arc::new(StringArray::from(vals.clone())) as ArrayRef)
            .collect();
        arrays.push(Arc::new(Float64Array::from(vec![100.0, 50.5])));
        arrays.push(Arc::new(Float64Array::from(vec![10.0, -2.5])));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

        let path = std::env::temp_dir().join(format!(
            "sales-dashboard-loader-{}.parquet",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path);
        let _ = std::fs::remove_file(&path);
        let table = table.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].order_date, Some(ymd(2016, 11, 8)));
        assert_eq!(table.records()[1].order_date, Some(ymd(2016, 6, 12)));
        assert_eq!(table.records()[0].returns, ReturnFlag::Returned);
        assert_eq!(table.records()[1].profit, -2.5);
    }
}
