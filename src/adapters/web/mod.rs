//! JSON API adapter.
//!
//! Exposes the record store and trade settlement over HTTP. Handlers share
//! a [`RecordStore`] through [`AppState`]; every failure comes back as a
//! [`WebError`] with the matching status code and a JSON error body.

mod error;
mod handlers;

pub use error::WebError;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::ports::store_port::RecordStore;

pub struct AppState {
    pub store: Arc<dyn RecordStore + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/investors",
            get(handlers::list_investors).post(handlers::create_investor),
        )
        .route(
            "/investors/{id}",
            get(handlers::get_investor)
                .patch(handlers::update_investor)
                .delete(handlers::delete_investor),
        )
        .route("/investors/{id}/accounts", get(handlers::investor_accounts))
        .route("/investors/{id}/holdings", get(handlers::investor_holdings))
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/{number}",
            get(handlers::get_account)
                .patch(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route("/accounts/{number}/holdings", get(handlers::account_holdings))
        .route("/accounts/{number}/trades", get(handlers::account_trades))
        .route(
            "/holdings",
            get(handlers::list_holdings).post(handlers::create_holding),
        )
        .route(
            "/holdings/{number}/{ticker}",
            get(handlers::get_holding)
                .patch(handlers::update_holding)
                .delete(handlers::delete_holding),
        )
        .route("/trades", get(handlers::list_trades))
        .route("/trades/sell", post(handlers::sell))
        .route("/trades/buy", post(handlers::buy))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
