use crate::period::PeriodKind;
use axum::http::StatusCode;
use std::path::PathBuf;

pub const EMPTY_PERIOD_NOTICE: &str = "No data for this period.";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("sales data not found at {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("sales data is missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("workbook has no worksheets")]
    NoWorksheet,
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("unknown period '{0}', expected daily, weekly, monthly or yearly")]
    UnknownKind(String),
    #[error("invalid {kind} value '{value}'")]
    InvalidValue { kind: PeriodKind, value: String },
    #[error("dataset has no records to select a period from")]
    NoData,
}

/// The selected period matched no records.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("no data for period {label}")]
pub struct EmptyPeriod {
    pub label: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        match err {
            PeriodError::NoData => Self::not_found(EMPTY_PERIOD_NOTICE),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<EmptyPeriod> for AppError {
    fn from(_: EmptyPeriod) -> Self {
        Self::not_found(EMPTY_PERIOD_NOTICE)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
