use crate::errors::PeriodError;
use crate::models::{Dataset, PeriodKeys, SalesRecord};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MONTH: &str = "2024-10";
pub const DEFAULT_YEAR: i32 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 4] = [
        PeriodKind::Monthly,
        PeriodKind::Yearly,
        PeriodKind::Weekly,
        PeriodKind::Daily,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Daily => "daily",
            PeriodKind::Weekly => "weekly",
            PeriodKind::Monthly => "monthly",
            PeriodKind::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(PeriodKind::Daily),
            "weekly" => Ok(PeriodKind::Weekly),
            "monthly" => Ok(PeriodKind::Monthly),
            "yearly" => Ok(PeriodKind::Yearly),
            _ => Err(PeriodError::UnknownKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PeriodSelector {
    Daily(NaiveDate),
    Weekly(String),
    Monthly(String),
    Yearly(i32),
}

impl PeriodSelector {
    pub fn kind(&self) -> PeriodKind {
        match self {
            PeriodSelector::Daily(_) => PeriodKind::Daily,
            PeriodSelector::Weekly(_) => PeriodKind::Weekly,
            PeriodSelector::Monthly(_) => PeriodKind::Monthly,
            PeriodSelector::Yearly(_) => PeriodKind::Yearly,
        }
    }

    pub fn matches(&self, record: &SalesRecord, keys: &PeriodKeys) -> bool {
        match self {
            PeriodSelector::Daily(date) => record.date == *date,
            PeriodSelector::Weekly(week) => keys.week == *week,
            PeriodSelector::Monthly(month) => keys.month == *month,
            PeriodSelector::Yearly(year) => keys.year == *year,
        }
    }

    /// Value as it appears in the selector controls.
    pub fn value_string(&self) -> String {
        match self {
            PeriodSelector::Daily(date) => date.format("%Y-%m-%d").to_string(),
            PeriodSelector::Weekly(week) => week.clone(),
            PeriodSelector::Monthly(month) => month.clone(),
            PeriodSelector::Yearly(year) => year.to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PeriodSelector::Daily(date) => date.format("%d %B %Y").to_string(),
            PeriodSelector::Weekly(week) => format!("Week {week}"),
            PeriodSelector::Monthly(month) => month.clone(),
            PeriodSelector::Yearly(year) => format!("Year {year}"),
        }
    }

    pub fn parse(kind: PeriodKind, value: &str) -> Result<Self, PeriodError> {
        let value = value.trim();
        let invalid = || PeriodError::InvalidValue {
            kind,
            value: value.to_string(),
        };
        match kind {
            PeriodKind::Daily => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(PeriodSelector::Daily)
                .map_err(|_| invalid()),
            PeriodKind::Weekly => parse_week(value)
                .map(|monday| PeriodSelector::Weekly(week_bucket(monday)))
                .ok_or_else(invalid),
            PeriodKind::Monthly => NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
                .map(|first| PeriodSelector::Monthly(month_bucket(first)))
                .map_err(|_| invalid()),
            PeriodKind::Yearly => value
                .parse::<i32>()
                .map(PeriodSelector::Yearly)
                .map_err(|_| invalid()),
        }
    }
}

pub fn month_bucket(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn week_bucket(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{:04}-W{:02}", iso.year(), iso.week())
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday of an ISO week written as `YYYY-Www`.
fn parse_week(value: &str) -> Option<NaiveDate> {
    let (year, week) = value.split_once("-W")?;
    let year = year.parse::<i32>().ok()?;
    let week = week.parse::<u32>().ok()?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekOption {
    pub bucket: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodDefaults {
    pub kind: PeriodKind,
    pub day: NaiveDate,
    pub week: String,
    pub month: String,
    pub year: i32,
}

/// Values offered by the period selector controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOptions {
    pub kinds: Vec<PeriodKind>,
    pub months: Vec<String>,
    pub weeks: Vec<WeekOption>,
    pub years: Vec<i32>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub defaults: PeriodDefaults,
}

impl PeriodOptions {
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, PeriodError> {
        let mut months = BTreeSet::new();
        let mut weeks = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut dates = BTreeSet::new();
        for (record, keys) in dataset.entries() {
            months.insert(keys.month.clone());
            weeks.insert((keys.week.clone(), week_start(record.date)));
            years.insert(keys.year);
            dates.insert(record.date);
        }

        let first_date = *dates.first().ok_or(PeriodError::NoData)?;
        let last_date = *dates.last().ok_or(PeriodError::NoData)?;
        let months: Vec<String> = months.into_iter().collect();
        let weeks: Vec<WeekOption> = weeks
            .into_iter()
            .map(|(bucket, start)| WeekOption {
                bucket,
                start,
                end: start + Duration::days(6),
            })
            .collect();
        let years: Vec<i32> = years.into_iter().collect();

        let month = if months.iter().any(|m| m == DEFAULT_MONTH) {
            DEFAULT_MONTH.to_string()
        } else {
            months[0].clone()
        };
        let year = if years.contains(&DEFAULT_YEAR) {
            DEFAULT_YEAR
        } else {
            years[0]
        };

        let defaults = PeriodDefaults {
            kind: PeriodKind::default(),
            day: last_date,
            week: weeks[0].bucket.clone(),
            month,
            year,
        };

        Ok(Self {
            kinds: PeriodKind::ALL.to_vec(),
            months,
            weeks,
            years,
            first_date,
            last_date,
            defaults,
        })
    }

    pub fn default_selector(&self, kind: PeriodKind) -> PeriodSelector {
        match kind {
            PeriodKind::Daily => PeriodSelector::Daily(self.defaults.day),
            PeriodKind::Weekly => PeriodSelector::Weekly(self.defaults.week.clone()),
            PeriodKind::Monthly => PeriodSelector::Monthly(self.defaults.month.clone()),
            PeriodKind::Yearly => PeriodSelector::Yearly(self.defaults.year),
        }
    }
}

/// Turns raw control values into a selector, filling in defaults for
/// whatever is missing.
pub fn resolve_selector(
    options: &PeriodOptions,
    kind: Option<&str>,
    value: Option<&str>,
) -> Result<PeriodSelector, PeriodError> {
    let kind = match kind.map(str::trim).filter(|k| !k.is_empty()) {
        Some(kind) => kind.parse()?,
        None => options.defaults.kind,
    };
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => PeriodSelector::parse(kind, value),
        None => Ok(options.default_selector(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(on: NaiveDate) -> SalesRecord {
        SalesRecord {
            number: "1".to_string(),
            date: on,
            variant: "Rose".to_string(),
            scent: None,
            quantity: 1,
            unit_price: None,
            unit_cost: None,
            stock: 0,
        }
    }

    fn dataset(dates: &[NaiveDate]) -> Dataset {
        Dataset::new(dates.iter().copied().map(record).collect(), false, 0)
    }

    #[test]
    fn month_bucket_is_zero_padded() {
        assert_eq!(month_bucket(date(2024, 3, 9)), "2024-03");
        assert_eq!(month_bucket(date(987, 12, 1)), "0987-12");
    }

    #[test]
    fn month_buckets_sort_chronologically() {
        let dates = [date(2024, 1, 31), date(2024, 2, 1), date(2024, 10, 5), date(2024, 12, 31)];
        for pair in dates.windows(2) {
            assert!(month_bucket(pair[0]) <= month_bucket(pair[1]));
        }
        assert!(month_bucket(date(999, 12, 1)) < month_bucket(date(1000, 1, 1)));
    }

    #[test]
    fn week_bucket_uses_iso_year() {
        // 2024-12-30 is a Monday in ISO week 1 of 2025.
        assert_eq!(week_bucket(date(2024, 12, 30)), "2025-W01");
        assert_eq!(week_bucket(date(2024, 10, 5)), "2024-W40");
        assert_eq!(week_bucket(date(2024, 10, 6)), "2024-W40");
        assert_eq!(week_bucket(date(2024, 10, 7)), "2024-W41");
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start(date(2024, 10, 6)), date(2024, 9, 30));
        assert_eq!(week_start(date(2024, 9, 30)), date(2024, 9, 30));
    }

    #[test]
    fn selector_matches_by_kind() {
        let r = record(date(2024, 10, 5));
        let keys = PeriodKeys::for_date(r.date);
        assert!(PeriodSelector::Daily(date(2024, 10, 5)).matches(&r, &keys));
        assert!(!PeriodSelector::Daily(date(2024, 10, 6)).matches(&r, &keys));
        assert!(PeriodSelector::Weekly("2024-W40".into()).matches(&r, &keys));
        assert!(PeriodSelector::Monthly("2024-10".into()).matches(&r, &keys));
        assert!(!PeriodSelector::Monthly("2024-11".into()).matches(&r, &keys));
        assert!(PeriodSelector::Yearly(2024).matches(&r, &keys));
        assert!(!PeriodSelector::Yearly(2023).matches(&r, &keys));
    }

    #[test]
    fn parse_normalizes_values() {
        assert_eq!(
            PeriodSelector::parse(PeriodKind::Monthly, " 2024-03 ").unwrap(),
            PeriodSelector::Monthly("2024-03".into())
        );
        assert_eq!(
            PeriodSelector::parse(PeriodKind::Weekly, "2024-W5").unwrap(),
            PeriodSelector::Weekly("2024-W05".into())
        );
        assert_eq!(
            PeriodSelector::parse(PeriodKind::Daily, " 2024-10-05 ").unwrap(),
            PeriodSelector::Daily(date(2024, 10, 5))
        );
        assert_eq!(
            PeriodSelector::parse(PeriodKind::Yearly, "2023").unwrap(),
            PeriodSelector::Yearly(2023)
        );
    }

    #[test]
    fn parse_rejects_malformed_values() {
        for (kind, value) in [
            (PeriodKind::Monthly, "2024-13"),
            (PeriodKind::Monthly, "October"),
            (PeriodKind::Weekly, "2024-W60"),
            (PeriodKind::Weekly, "2024-40"),
            (PeriodKind::Daily, "05/10/2024"),
            (PeriodKind::Yearly, "twenty"),
        ] {
            assert!(matches!(
                PeriodSelector::parse(kind, value),
                Err(PeriodError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Weekly".parse::<PeriodKind>().unwrap(), PeriodKind::Weekly);
        assert_eq!(
            "hourly".parse::<PeriodKind>(),
            Err(PeriodError::UnknownKind("hourly".into()))
        );
    }

    #[test]
    fn options_prefer_october_2024() {
        let ds = dataset(&[date(2024, 9, 2), date(2024, 10, 5), date(2024, 11, 1)]);
        let options = PeriodOptions::from_dataset(&ds).unwrap();
        assert_eq!(options.months, vec!["2024-09", "2024-10", "2024-11"]);
        assert_eq!(options.defaults.month, "2024-10");
        assert_eq!(options.defaults.kind, PeriodKind::Monthly);
        assert_eq!(options.defaults.day, date(2024, 11, 1));
        assert_eq!(options.defaults.year, 2024);
        assert_eq!(options.defaults.week, "2024-W36");
        assert_eq!(options.weeks[0].start, date(2024, 9, 2));
        assert_eq!(options.weeks[0].end, date(2024, 9, 8));
    }

    #[test]
    fn options_fall_back_to_earliest() {
        let ds = dataset(&[date(2023, 4, 2), date(2022, 3, 15)]);
        let options = PeriodOptions::from_dataset(&ds).unwrap();
        assert_eq!(options.defaults.month, "2022-03");
        assert_eq!(options.defaults.year, 2022);
        assert_eq!(options.years, vec![2022, 2023]);
        assert_eq!(options.first_date, date(2022, 3, 15));
        assert_eq!(options.last_date, date(2023, 4, 2));
    }

    #[test]
    fn options_require_records() {
        assert_eq!(
            PeriodOptions::from_dataset(&Dataset::default()),
            Err(PeriodError::NoData)
        );
    }

    #[test]
    fn resolve_fills_defaults() {
        let ds = dataset(&[date(2024, 10, 5), date(2024, 11, 1)]);
        let options = PeriodOptions::from_dataset(&ds).unwrap();
        assert_eq!(
            resolve_selector(&options, None, None).unwrap(),
            PeriodSelector::Monthly("2024-10".into())
        );
        assert_eq!(
            resolve_selector(&options, Some("daily"), Some("")).unwrap(),
            PeriodSelector::Daily(date(2024, 11, 1))
        );
        assert_eq!(
            resolve_selector(&options, Some("yearly"), Some("2021")).unwrap(),
            PeriodSelector::Yearly(2021)
        );
        assert!(resolve_selector(&options, Some("quarterly"), None).is_err());
    }

    #[test]
    fn labels_follow_period_kind() {
        assert_eq!(PeriodSelector::Daily(date(2024, 10, 5)).label(), "05 October 2024");
        assert_eq!(PeriodSelector::Weekly("2024-W40".into()).label(), "Week 2024-W40");
        assert_eq!(PeriodSelector::Monthly("2024-10".into()).label(), "2024-10");
        assert_eq!(PeriodSelector::Yearly(2024).label(), "Year 2024");
    }
}
