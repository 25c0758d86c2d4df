//! HTTP request handlers for the JSON API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::domain::account::{Account, AccountPatch, NewAccount};
use crate::domain::holding::{Holding, HoldingPatch, NewHolding};
use crate::domain::investor::{Investor, InvestorPatch, NewInvestor};
use crate::domain::trade::{PurchaseOrder, SaleOrder, SettlementResult, TradeRecord};

use super::{AppState, WebError};

pub async fn list_investors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Investor>>, WebError> {
    Ok(Json(state.store.list_investors()?))
}

pub async fn create_investor(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewInvestor>,
) -> Result<Response, WebError> {
    let investor = state.store.create_investor(&new)?;
    Ok((StatusCode::CREATED, Json(investor)).into_response())
}

pub async fn get_investor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Investor>, WebError> {
    Ok(Json(state.store.get_investor(id)?))
}

pub async fn update_investor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<InvestorPatch>,
) -> Result<Json<Investor>, WebError> {
    Ok(Json(state.store.update_investor(id, &patch)?))
}

pub async fn delete_investor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, WebError> {
    state.store.delete_investor(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn investor_accounts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Account>>, WebError> {
    // 404 for an unknown investor, not an empty list.
    state.store.get_investor(id)?;
    Ok(Json(state.store.accounts_for_investor(id)?))
}

pub async fn investor_holdings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Holding>>, WebError> {
    state.store.get_investor(id)?;
    Ok(Json(state.store.holdings_for_investor(id)?))
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, WebError> {
    Ok(Json(state.store.list_accounts()?))
}

pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewAccount>,
) -> Result<Response, WebError> {
    let account = state.store.create_account(&new)?;
    Ok((StatusCode::CREATED, Json(account)).into_response())
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
) -> Result<Json<Account>, WebError> {
    Ok(Json(state.store.get_account(number)?))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
    Json(patch): Json<AccountPatch>,
) -> Result<Json<Account>, WebError> {
    Ok(Json(state.store.update_account(number, &patch)?))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
) -> Result<StatusCode, WebError> {
    state.store.delete_account(number)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn account_holdings(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
) -> Result<Json<Vec<Holding>>, WebError> {
    state.store.get_account(number)?;
    Ok(Json(state.store.holdings_for_account(number)?))
}

pub async fn account_trades(
    State(state): State<Arc<AppState>>,
    Path(number): Path<i64>,
) -> Result<Json<Vec<TradeRecord>>, WebError> {
    state.store.get_account(number)?;
    Ok(Json(state.store.trades_for_account(number)?))
}

pub async fn list_holdings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Holding>>, WebError> {
    Ok(Json(state.store.list_holdings()?))
}

pub async fn create_holding(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewHolding>,
) -> Result<Response, WebError> {
    let holding = state.store.create_holding(&new)?;
    Ok((StatusCode::CREATED, Json(holding)).into_response())
}

pub async fn get_holding(
    State(state): State<Arc<AppState>>,
    Path((number, ticker)): Path<(i64, String)>,
) -> Result<Json<Holding>, WebError> {
    Ok(Json(state.store.get_holding(number, &ticker)?))
}

pub async fn update_holding(
    State(state): State<Arc<AppState>>,
    Path((number, ticker)): Path<(i64, String)>,
    Json(patch): Json<HoldingPatch>,
) -> Result<Json<Holding>, WebError> {
    Ok(Json(state.store.update_holding(number, &ticker, &patch)?))
}

pub async fn delete_holding(
    State(state): State<Arc<AppState>>,
    Path((number, ticker)): Path<(i64, String)>,
) -> Result<StatusCode, WebError> {
    state.store.delete_holding(number, &ticker)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trades(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TradeRecord>>, WebError> {
    Ok(Json(state.store.list_trades()?))
}

pub async fn sell(
    State(state): State<Arc<AppState>>,
    Json(order): Json<SaleOrder>,
) -> Result<Json<SettlementResult>, WebError> {
    Ok(Json(state.store.settle_sale(&order)?))
}

pub async fn buy(
    State(state): State<Arc<AppState>>,
    Json(order): Json<PurchaseOrder>,
) -> Result<Json<SettlementResult>, WebError> {
    Ok(Json(state.store.settle_purchase(&order)?))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such route")
}
