//! Exchange API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{Exchange, ProposeExchangeRequest};
use crate::AppState;

/// GET /api/exchanges - List all exchanges, most recent first.
pub async fn list_exchanges(State(state): State<AppState>) -> ApiResult<Vec<Exchange>> {
    let store = state.exchanges.lock().await;
    success(store.list().to_vec())
}

/// GET /api/exchanges/:id - Get a single exchange.
pub async fn get_exchange(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exchange> {
    let store = state.exchanges.lock().await;
    match store.get(&id) {
        Some(exchange) => success(exchange.clone()),
        None => Err(not_found(&id)),
    }
}

/// POST /api/exchanges - Propose a new exchange.
pub async fn propose_exchange(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProposeExchangeRequest>,
) -> ApiResult<Exchange> {
    let mut store = state.exchanges.lock().await;
    success(store.propose(request).await?)
}

/// POST /api/exchanges/:id/accept
pub async fn accept_exchange(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exchange> {
    let mut store = state.exchanges.lock().await;
    let updated = store.accept(&id).await?;
    found(&id, updated)
}

/// POST /api/exchanges/:id/finish
pub async fn finish_exchange(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exchange> {
    let mut store = state.exchanges.lock().await;
    let updated = store.finish(&id).await?;
    found(&id, updated)
}

/// POST /api/exchanges/:id/resume
pub async fn resume_exchange(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exchange> {
    let mut store = state.exchanges.lock().await;
    let updated = store.resume(&id).await?;
    found(&id, updated)
}

/// POST /api/exchanges/:id/cancel
pub async fn cancel_exchange(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exchange> {
    let mut store = state.exchanges.lock().await;
    let updated = store.cancel(&id).await?;
    found(&id, updated)
}

/// GET /api/users/:user_id/exchanges/incoming - Pending requests addressed to the user.
pub async fn incoming_requests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Exchange>> {
    let store = state.exchanges.lock().await;
    success(store.incoming_requests(&user_id))
}

/// GET /api/users/:user_id/exchanges/active - Non-pending exchanges involving the user.
pub async fn active_exchanges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Exchange>> {
    let store = state.exchanges.lock().await;
    success(store.active_exchanges(&user_id))
}

fn found(id: &str, exchange: Option<Exchange>) -> ApiResult<Exchange> {
    match exchange {
        Some(exchange) => success(exchange),
        None => Err(not_found(id)),
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Exchange {} not found", id))
}
