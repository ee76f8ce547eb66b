//! Reads the sales sheet into a [`Dataset`].
//!
//! Workbooks go through `calamine`, `.csv` files through the `csv` crate.
//! Both are first flattened into a [`RawTable`] so that header matching, date
//! parsing and row validation happen in one place.

use crate::errors::LoadError;
use crate::models::{Dataset, SalesRecord};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info, warn};

pub const COL_NUMBER: &str = "No";
pub const COL_DATE: &str = "Tanggal";
pub const COL_VARIANT: &str = "Varian";
pub const COL_SCENT: &str = "Aroma";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_PRICE: &str = "Harga Barang";
pub const COL_COST: &str = "HPP";
pub const COL_STOCK: &str = "Stok Barang";

const REQUIRED_COLUMNS: [&str; 7] = [
    COL_NUMBER,
    COL_DATE,
    COL_VARIANT,
    COL_QUANTITY,
    COL_PRICE,
    COL_COST,
    COL_STOCK,
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// Month-first before day-first, so `03/04/2024` is March 4th.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
];

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::DateTime(value) => value.to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(text) | Data::DateTimeIso(text) => Cell::Text(text.clone()),
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::DateTime(_) => data
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or(Cell::Empty),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Header row plus data rows, before any typing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    if !path.is_file() {
        return Err(LoadError::SourceNotFound(path.to_path_buf()));
    }

    let table = if is_csv(path) {
        read_csv(path)?
    } else {
        read_workbook(path)?
    };
    debug!(
        "read {} rows and {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );

    let dataset = build_dataset(table)?;
    if dataset.dropped_rows() > 0 {
        warn!(
            "dropped {} rows with an unreadable {COL_DATE} value",
            dataset.dropped_rows()
        );
    }
    if dataset.skipped_rows() > 0 {
        warn!(
            "skipped {} rows with a blank {COL_VARIANT} or unreadable {COL_QUANTITY}/{COL_STOCK}",
            dataset.skipped_rows()
        );
    }
    info!(
        "loaded {} sales records from {} (scent column: {})",
        dataset.len(),
        path.display(),
        dataset.has_scent()
    );
    Ok(dataset)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(RawTable::default());
    };
    let headers = header.iter().map(|cell| Cell::from(cell).display()).collect();
    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    Ok(RawTable { headers, rows })
}

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable { headers, rows })
}

struct Columns {
    number: usize,
    date: usize,
    variant: usize,
    scent: Option<usize>,
    quantity: usize,
    price: usize,
    cost: usize,
    stock: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self, LoadError> {
        let trimmed: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
        let position = |name: &str| trimmed.iter().position(|h| *h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::Schema { missing });
        }

        let required = |name: &str| position(name).ok_or_else(|| LoadError::Schema {
            missing: vec![name.to_string()],
        });
        Ok(Self {
            number: required(COL_NUMBER)?,
            date: required(COL_DATE)?,
            variant: required(COL_VARIANT)?,
            scent: position(COL_SCENT),
            quantity: required(COL_QUANTITY)?,
            price: required(COL_PRICE)?,
            cost: required(COL_COST)?,
            stock: required(COL_STOCK)?,
        })
    }
}

/// Types the raw rows. Rows whose date does not parse are dropped; rows with
/// a valid date but a blank variant or an unreadable quantity/stock are
/// skipped. Both are counted, neither fails the load.
pub fn build_dataset(table: RawTable) -> Result<Dataset, LoadError> {
    let columns = Columns::resolve(&table.headers)?;
    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;
    let mut skipped = 0usize;

    for (index, row) in table.rows.iter().enumerate() {
        // Sheet row number, counting the header as row 1.
        let row_number = index + 2;
        let cell = |idx: usize| row.get(idx).unwrap_or(&EMPTY_CELL);

        let Some(date) = parse_date(cell(columns.date)) else {
            dropped += 1;
            continue;
        };

        let variant = cell(columns.variant);
        let quantity = parse_count(cell(columns.quantity));
        let stock = parse_count(cell(columns.stock));
        let (Some(quantity), Some(stock)) = (quantity, stock) else {
            debug!("row {row_number}: unreadable {COL_QUANTITY} or {COL_STOCK}, skipped");
            skipped += 1;
            continue;
        };
        if variant.is_blank() {
            debug!("row {row_number}: blank {COL_VARIANT}, skipped");
            skipped += 1;
            continue;
        }

        let scent = columns
            .scent
            .map(cell)
            .filter(|c| !c.is_blank())
            .map(Cell::display);

        records.push(SalesRecord {
            number: cell(columns.number).display(),
            date,
            variant: variant.display(),
            scent,
            quantity,
            unit_price: parse_amount(cell(columns.price)),
            unit_cost: parse_amount(cell(columns.cost)),
            stock,
        });
    }

    Ok(Dataset::new(records, columns.scent.is_some(), dropped).with_skipped_rows(skipped))
}

/// Permissive date reading; `None` marks the row as unusable.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(value) => Some(value.date()),
        Cell::Text(text) => parse_date_str(text),
        Cell::Empty | Cell::Number(_) => None,
    }
}

fn parse_date_str(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// Non-negative whole number. Blank counts as zero.
fn parse_count(cell: &Cell) -> Option<u64> {
    let value = match cell {
        Cell::Empty => return Some(0),
        Cell::Number(value) => *value,
        Cell::Text(text) if text.trim().is_empty() => return Some(0),
        Cell::Text(text) => {
            let text = text.trim();
            if let Ok(value) = text.parse::<u64>() {
                return Some(value);
            }
            text.parse::<f64>().ok()?
        }
        Cell::DateTime(_) => return None,
    };
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

/// Decimal amount, `None` when blank or not a plain number. Price and
/// cost are carried for display only.
fn parse_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(value) => Some(*value),
        Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Cell::Empty | Cell::DateTime(_) => None,
    }
}
