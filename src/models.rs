use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the sales sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub number: String,
    pub date: NaiveDate,
    pub variant: String,
    pub scent: Option<String>,
    pub quantity: u64,
    pub unit_price: Option<f64>,
    pub unit_cost: Option<f64>,
    pub stock: u64,
}

/// Period keys derived from a record's date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodKeys {
    pub month: String,
    pub week: String,
    pub year: i32,
}

impl PeriodKeys {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            month: crate::period::month_bucket(date),
            week: crate::period::week_bucket(date),
            year: date.year(),
        }
    }
}

/// Loaded sales table. Immutable for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
    keys: Vec<PeriodKeys>,
    has_scent: bool,
    dropped_rows: usize,
    skipped_rows: usize,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>, has_scent: bool, dropped_rows: usize) -> Self {
        let keys = records.iter().map(|r| PeriodKeys::for_date(r.date)).collect();
        Self {
            records,
            keys,
            has_scent,
            dropped_rows,
            skipped_rows: 0,
        }
    }

    pub fn with_skipped_rows(mut self, skipped_rows: usize) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn entries(&self) -> impl Iterator<Item = (&SalesRecord, &PeriodKeys)> {
        self.records.iter().zip(self.keys.iter())
    }

    /// Whether the source sheet carried an `Aroma` column.
    pub fn has_scent(&self) -> bool {
        self.has_scent
    }

    /// Rows discarded at load time because their date did not parse.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Rows with a valid date but a blank variant or unreadable quantity/stock.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub selector: crate::period::PeriodSelector,
    pub label: String,
    pub total_quantity_selected: u64,
    pub total_quantity_all: u64,
    pub distinct_variant_count: usize,
    /// `None` when the dataset has no scent column.
    pub distinct_scent_count: Option<usize>,
    pub total_stock: u64,
    pub per_variant_totals: Vec<GroupTotal>,
    pub per_scent_totals: Option<Vec<GroupTotal>>,
    pub stock_by_variant: Vec<GroupTotal>,
    pub records: Vec<SalesRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub source: String,
    pub records: usize,
    pub dropped_rows: usize,
    pub skipped_rows: usize,
}
