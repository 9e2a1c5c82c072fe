use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::accruals::parse_date;
use crate::api::AppState;
use crate::domain::{AccountId, LedgerEntry, TransferInstruction};
use crate::error::AppError;
use crate::store::AccrualStore;

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub account_id: AccountId,
    pub total_amount: i64,
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TransfersQuery {
    /// `YYYY-MM`
    pub month: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersResponse {
    pub account_id: AccountId,
    pub month_total: i64,
    pub transfers: Vec<TransferInstruction>,
}

pub async fn get_ledger(
    Path(account_id): Path<i64>,
    Query(params): Query<LedgerQuery>,
    State(state): State<AppState>,
) -> Result<Json<LedgerResponse>, AppError> {
    let account_id = AccountId::new(account_id);
    let date = params.date.as_deref().map(parse_date).transpose()?;

    state.repo.get_account(account_id).await?;
    let entries = state.repo.query_ledger_entries(account_id, date).await?;

    Ok(Json(LedgerResponse {
        account_id,
        total_amount: entries.iter().map(|e| e.amount).sum(),
        entries,
    }))
}

pub async fn get_transfers(
    Path(account_id): Path<i64>,
    Query(params): Query<TransfersQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransfersResponse>, AppError> {
    let account_id = AccountId::new(account_id);
    let month_of = NaiveDate::parse_from_str(&format!("{}-01", params.month.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("month must be YYYY-MM".into()))?;

    state.repo.get_account(account_id).await?;
    let transfers = state
        .repo
        .query_transfer_instructions(account_id, month_of)
        .await?;

    Ok(Json(TransfersResponse {
        account_id,
        month_total: transfers.iter().map(|t| t.amount).sum(),
        transfers,
    }))
}
