use crate::errors::{AppError, PeriodError};
use crate::models::{AggregateResult, HealthResponse, PeriodQuery};
use crate::period::{resolve_selector, PeriodOptions, PeriodSelector};
use crate::state::AppState;
use crate::stats::aggregate;
use crate::ui::{render_dashboard, DashboardView};
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use tracing::info;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Html<String>, AppError> {
    let Some(options) = state.options.as_deref() else {
        return Ok(Html(render_dashboard(&DashboardView::NoData)));
    };
    let selector = selector_for(options, &query)?;

    let html = match aggregate(&state.dataset, &selector) {
        Ok(result) => render_dashboard(&DashboardView::Ready {
            options,
            result: &result,
        }),
        Err(err) => {
            info!("{err}");
            render_dashboard(&DashboardView::Empty {
                options,
                selector: &selector,
            })
        }
    };
    Ok(Html(html))
}

pub async fn get_periods(State(state): State<AppState>) -> Result<Json<PeriodOptions>, AppError> {
    let options = state.options.as_deref().ok_or(PeriodError::NoData)?;
    Ok(Json(options.clone()))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<AggregateResult>, AppError> {
    let options = state.options.as_deref().ok_or(PeriodError::NoData)?;
    let selector = selector_for(options, &query)?;
    let result = aggregate(&state.dataset, &selector)?;
    Ok(Json(result))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        source: state.data_path.display().to_string(),
        records: state.dataset.len(),
        dropped_rows: state.dataset.dropped_rows(),
        skipped_rows: state.dataset.skipped_rows(),
    })
}

fn selector_for(options: &PeriodOptions, query: &PeriodQuery) -> Result<PeriodSelector, AppError> {
    Ok(resolve_selector(
        options,
        query.period.as_deref(),
        query.value.as_deref(),
    )?)
}
