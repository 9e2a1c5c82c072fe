pub mod accruals;
pub mod health;
pub mod ledger;

use crate::db::Repository;
use crate::orchestration::AccrualRunner;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub runner: Arc<AccrualRunner>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, runner: Arc<AccrualRunner>) -> Self {
        Self { repo, runner }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/accruals/:date", post(accruals::run_accrual))
        .route("/v1/accounts/:id/ledger", get(ledger::get_ledger))
        .route("/v1/accounts/:id/transfers", get(ledger::get_transfers))
        .layer(cors)
        .with_state(state)
}
