//! File-backed store integration tests: durability across reopen and the
//! concurrent-sale race the settlement transaction exists to prevent.

use std::sync::Arc;
use std::thread;

use folioback::adapters::sqlite_store::SqliteStore;
use folioback::domain::account::NewAccount;
use folioback::domain::error::FoliobackError;
use folioback::domain::holding::NewHolding;
use folioback::domain::investor::{InvestorStatus, NewInvestor};
use folioback::domain::trade::SaleOrder;
use folioback::ports::store_port::{AccountStore, HoldingStore, InvestorStore};
use folioback::ports::trade_port::TradePort;
use tempfile::TempDir;

fn open_store(dir: &TempDir, pool_size: u32) -> SqliteStore {
    let path = dir.path().join("folioback.db");
    let store = SqliteStore::open(path, pool_size, 5000).unwrap();
    store.initialize_schema().unwrap();
    store
}

/// Seed one investor with one account holding `quantity` shares of `ticker`.
fn seed_holding(
    store: &SqliteStore,
    ticker: &str,
    quantity: i64,
    balance: f64,
) -> i64 {
    let investor = store
        .create_investor(&NewInvestor {
            name: "Sam".into(),
            status: InvestorStatus::Active,
        })
        .unwrap();
    let account = store
        .create_account(&NewAccount {
            investor_id: investor.id,
            balance,
        })
        .unwrap();
    store
        .create_holding(&NewHolding {
            account_number: account.account_number,
            ticker: ticker.into(),
            quantity,
            purchase_price: 1.0,
        })
        .unwrap();
    account.account_number
}

fn sale(account: i64, ticker: &str, quantity: i64, price: f64) -> SaleOrder {
    SaleOrder {
        account_number: account,
        ticker: ticker.into(),
        quantity,
        price,
    }
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("folioback.db");

    let account_number = {
        let store = SqliteStore::open(&path, 2, 5000).unwrap();
        store.initialize_schema().unwrap();
        seed_holding(&store, "BHP", 7, 42.0)
    };

    let reopened = SqliteStore::open(&path, 2, 5000).unwrap();
    let account = reopened.get_account(account_number).unwrap();
    assert!((account.balance - 42.0).abs() < f64::EPSILON);

    let holding = reopened.get_holding(account_number, "BHP").unwrap();
    assert_eq!(holding.quantity, 7);
}

#[test]
fn settlement_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("folioback.db");

    let store = SqliteStore::open(&path, 2, 5000).unwrap();
    store.initialize_schema().unwrap();
    let account_number = seed_holding(&store, "BHP", 10, 100.0);
    store
        .settle_sale(&sale(account_number, "BHP", 4, 3.0))
        .unwrap();
    drop(store);

    let reopened = SqliteStore::open(&path, 2, 5000).unwrap();
    assert_eq!(reopened.get_holding(account_number, "BHP").unwrap().quantity, 6);
    assert!((reopened.get_account(account_number).unwrap().balance - 112.0).abs() < 1e-9);
    assert_eq!(reopened.trades_for_account(account_number).unwrap().len(), 1);
}

#[test]
fn concurrent_sales_exactly_one_succeeds() {
    // Two sales of 6 against a holding of 10: the settlement transaction
    // must not let both pass the sufficiency check on the stale quantity.
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir, 4));
    let account_number = seed_holding(&store, "ABC", 10, 0.0);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.settle_sale(&sale(account_number, "ABC", 6, 2.0)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(FoliobackError::InsufficientHoldings {
                    requested: 6,
                    ..
                })
            )
        })
        .count();
    assert_eq!(succeeded, 1, "results: {results:?}");
    assert_eq!(insufficient, 1, "results: {results:?}");

    let holding = store.get_holding(account_number, "ABC").unwrap();
    assert_eq!(holding.quantity, 4);

    let account = store.get_account(account_number).unwrap();
    assert!((account.balance - 12.0).abs() < 1e-9);

    assert_eq!(store.trades_for_account(account_number).unwrap().len(), 1);
}

#[test]
fn concurrent_sales_on_unrelated_accounts_both_succeed() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir, 4));
    let first = seed_holding(&store, "AAA", 5, 0.0);
    let second = seed_holding(&store, "BBB", 5, 0.0);

    let handles: Vec<_> = [(first, "AAA"), (second, "BBB")]
        .into_iter()
        .map(|(account, ticker)| {
            let store = Arc::clone(&store);
            let ticker = ticker.to_string();
            thread::spawn(move || store.settle_sale(&sale(account, &ticker, 5, 1.0)))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result.remaining_quantity, 0);
        assert!(result.holding_removed);
    }

    assert!((store.get_account(first).unwrap().balance - 5.0).abs() < 1e-9);
    assert!((store.get_account(second).unwrap().balance - 5.0).abs() < 1e-9);
}

#[test]
fn oversell_under_contention_never_goes_negative() {
    // Ten threads each try to sell 3 out of 10; at most three can win.
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir, 4));
    let account_number = seed_holding(&store, "XYZ", 10, 0.0);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.settle_sale(&sale(account_number, "XYZ", 3, 1.0)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3, "results: {results:?}");

    let holding = store.get_holding(account_number, "XYZ").unwrap();
    assert_eq!(holding.quantity, 1);
    assert!((store.get_account(account_number).unwrap().balance - 9.0).abs() < 1e-9);
}
