use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;

use crate::api::AppState;
use crate::error::AppError;
use crate::orchestration::Summary;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date {:?}, expected YYYY-MM-DD", raw)))
}

/// Run the accrual engine for one date. Repeating the call is harmless.
pub async fn run_accrual(
    Path(date): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Summary>, AppError> {
    let date = parse_date(&date)?;
    let summary = state.runner.process_accrual_for_date(date).await?;
    Ok(Json(summary))
}
