#![cfg(feature = "web")]
//! JSON API integration tests driven through `tower::ServiceExt::oneshot`.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use folioback::adapters::sqlite_store::SqliteStore;
use folioback::adapters::web::{AppState, build_router};
use folioback::domain::account::NewAccount;
use folioback::domain::holding::NewHolding;
use folioback::domain::investor::{InvestorStatus, NewInvestor};
use folioback::ports::store_port::{AccountStore, HoldingStore, InvestorStore};

/// Router over an in-memory store seeded with one investor whose account
/// holds 10 AAPL at $1 and $100 cash. Returns (app, investor id, account
/// number).
fn seeded_app() -> (Router, i64, i64) {
    let store = SqliteStore::in_memory().unwrap();
    store.initialize_schema().unwrap();

    let investor = store
        .create_investor(&NewInvestor {
            name: "Sam".into(),
            status: InvestorStatus::Active,
        })
        .unwrap();
    let account = store
        .create_account(&NewAccount {
            investor_id: investor.id,
            balance: 100.0,
        })
        .unwrap();
    store
        .create_holding(&NewHolding {
            account_number: account.account_number,
            ticker: "AAPL".into(),
            quantity: 10,
            purchase_price: 1.0,
        })
        .unwrap();

    let app = build_router(AppState {
        store: Arc::new(store),
    });
    (app, investor.id, account.account_number)
}

fn empty_app() -> Router {
    let store = SqliteStore::in_memory().unwrap();
    store.initialize_schema().unwrap();
    build_router(AppState {
        store: Arc::new(store),
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_investor_round_trips() {
    let app = empty_app();

    let (status, created) = send(
        &app,
        "POST",
        "/investors",
        Some(json!({"name": "Alex", "status": "active"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Alex");

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/investors/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_account_returns_404_with_error_body() {
    let app = empty_app();

    let (status, body) = send(&app, "GET", "/accounts/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("account"));
}

#[tokio::test]
async fn create_account_for_missing_investor_returns_409() {
    let app = empty_app();

    let (status, _) = send(
        &app,
        "POST",
        "/accounts",
        Some(json!({"investor_id": 42, "balance": 10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let (app, investor_id, _) = seeded_app();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/investors/{investor_id}"),
        Some(json!({"status": "inactive"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Sam");
    assert_eq!(updated["status"], "inactive");
}

#[tokio::test]
async fn delete_investor_with_accounts_returns_409() {
    let (app, investor_id, _) = seeded_app();

    let (status, _) = send(&app, "DELETE", &format!("/investors/{investor_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "GET", &format!("/investors/{investor_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sell_returns_settlement_result() {
    let (app, _, account) = seeded_app();

    let (status, result) = send(
        &app,
        "POST",
        "/trades/sell",
        Some(json!({
            "account_number": account,
            "ticker": "AAPL",
            "quantity": 2,
            "price": 2.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["remaining_quantity"], 8);
    assert_eq!(result["new_balance"], 104.0);
    assert_eq!(result["holding_removed"], false);

    let (_, account_body) = send(&app, "GET", &format!("/accounts/{account}"), None).await;
    assert_eq!(account_body["balance"], 104.0);
}

#[tokio::test]
async fn oversell_returns_422_and_changes_nothing() {
    let (app, _, account) = seeded_app();

    let (status, body) = send(
        &app,
        "POST",
        "/trades/sell",
        Some(json!({
            "account_number": account,
            "ticker": "AAPL",
            "quantity": 11,
            "price": 2.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("insufficient holdings"));

    let (_, holding) = send(&app, "GET", &format!("/holdings/{account}/AAPL"), None).await;
    assert_eq!(holding["quantity"], 10);
}

#[tokio::test]
async fn invalid_order_returns_400() {
    let (app, _, account) = seeded_app();

    let (status, _) = send(
        &app,
        "POST",
        "/trades/sell",
        Some(json!({
            "account_number": account,
            "ticker": "AAPL",
            "quantity": 0,
            "price": 2.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn selling_entire_holding_removes_it() {
    let (app, _, account) = seeded_app();

    let (status, result) = send(
        &app,
        "POST",
        "/trades/sell",
        Some(json!({
            "account_number": account,
            "ticker": "AAPL",
            "quantity": 10,
            "price": 2.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["holding_removed"], true);

    let (status, _) = send(&app, "GET", &format!("/holdings/{account}/AAPL"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn buy_creates_holding_and_debits_account() {
    let (app, _, account) = seeded_app();

    let (status, result) = send(
        &app,
        "POST",
        "/trades/buy",
        Some(json!({
            "account_number": account,
            "ticker": "MSFT",
            "quantity": 2,
            "price": 30.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["remaining_quantity"], 2);
    assert_eq!(result["new_balance"], 40.0);

    let (_, holdings) = send(&app, "GET", &format!("/accounts/{account}/holdings"), None).await;
    assert_eq!(holdings.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn investor_holdings_returns_404_for_unknown_investor() {
    let app = empty_app();

    let (status, _) = send(&app, "GET", "/investors/7/holdings", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trades_log_grows_with_settlements() {
    let (app, _, account) = seeded_app();

    let (_, before) = send(&app, "GET", "/trades", None).await;
    assert!(before.as_array().unwrap().is_empty());

    send(
        &app,
        "POST",
        "/trades/sell",
        Some(json!({
            "account_number": account,
            "ticker": "AAPL",
            "quantity": 1,
            "price": 3.0
        })),
    )
    .await;

    let (status, after) = send(&app, "GET", "/trades", None).await;
    assert_eq!(status, StatusCode::OK);
    let trades = after.as_array().unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0]["side"], "sell");
    assert_eq!(trades[0]["ticker"], "AAPL");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = empty_app();

    let (status, body) = send(&app, "GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
