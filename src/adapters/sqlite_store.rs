//! SQLite record store adapter.
//!
//! All storage access goes through an r2d2 connection pool owned by
//! [`SqliteStore`]; callers construct the store and pass it around, so
//! connection lifetime and credentials stay in their hands. Settlement
//! runs inside an immediate (write-locking) transaction, which is what
//! keeps two concurrent sales from passing the sufficiency check against
//! a stale quantity. Lock waits are bounded by `busy_timeout`; expiry
//! surfaces as `StorageUnavailable`.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, TransactionBehavior};

use crate::domain::account::{Account, AccountPatch, NewAccount};
use crate::domain::error::FoliobackError;
use crate::domain::holding::{Holding, HoldingPatch, NewHolding};
use crate::domain::investor::{Investor, InvestorPatch, InvestorStatus, NewInvestor};
use crate::domain::trade::{
    self, PurchaseOrder, SaleOrder, SettlementResult, TradeRecord, TradeSide,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{AccountStore, HoldingStore, InvestorStore};
use crate::ports::trade_port::TradePort;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FoliobackError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| FoliobackError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("database", "pool_size", 4);
        if pool_size < 1 {
            return Err(FoliobackError::ConfigInvalid {
                section: "database".into(),
                key: "pool_size".into(),
                reason: format!("must be at least 1, got {pool_size}"),
            });
        }

        let busy_timeout_ms = config.get_int("database", "busy_timeout_ms", 5000);
        if busy_timeout_ms < 1 {
            return Err(FoliobackError::ConfigInvalid {
                section: "database".into(),
                key: "busy_timeout_ms".into(),
                reason: format!("must be at least 1, got {busy_timeout_ms}"),
            });
        }

        Self::open(&db_path, pool_size as u32, busy_timeout_ms as u64)
    }

    /// Open a file-backed store with WAL journaling and enforced foreign
    /// keys on every pooled connection.
    pub fn open<P: AsRef<Path>>(
        path: P,
        pool_size: u32,
        busy_timeout_ms: u64,
    ) -> Result<Self, FoliobackError> {
        let busy = Duration::from_millis(busy_timeout_ms);
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.query_row("PRAGMA journal_mode=WAL", [], |_row| Ok(()))?;
            Ok(())
        });
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(busy)
            .build(manager)
            .map_err(|e: r2d2::Error| FoliobackError::StorageUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory store for tests. One connection only:
    /// each in-memory connection is its own database.
    pub fn in_memory() -> Result<Self, FoliobackError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.pragma_update(None, "foreign_keys", "ON"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FoliobackError::StorageUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), FoliobackError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS investor (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
            );
            CREATE TABLE IF NOT EXISTS account (
                account_number INTEGER PRIMARY KEY AUTOINCREMENT,
                investor_id INTEGER NOT NULL REFERENCES investor(id),
                balance REAL NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS portfolio (
                account_number INTEGER NOT NULL REFERENCES account(account_number),
                ticker TEXT NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity >= 0),
                purchase_price REAL NOT NULL,
                PRIMARY KEY (account_number, ticker)
            );
            CREATE TABLE IF NOT EXISTS trade_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_number INTEGER NOT NULL,
                ticker TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                executed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_account_investor ON account(investor_id);
            CREATE INDEX IF NOT EXISTS idx_trade_log_account ON trade_log(account_number);",
        )
        .map_err(Self::query_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FoliobackError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| FoliobackError::StorageUnavailable {
                reason: e.to_string(),
            })
    }

    fn query_err(err: rusqlite::Error) -> FoliobackError {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    FoliobackError::StorageUnavailable {
                        reason: err.to_string(),
                    }
                }
                ErrorCode::ConstraintViolation => FoliobackError::ConstraintViolation {
                    reason: err.to_string(),
                },
                _ => FoliobackError::Database {
                    reason: err.to_string(),
                },
            },
            _ => FoliobackError::Database {
                reason: err.to_string(),
            },
        }
    }
}

fn row_to_investor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Investor> {
    let status_text: String = row.get(2)?;
    let status = InvestorStatus::parse(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown investor status: {status_text}").into(),
        )
    })?;
    Ok(Investor {
        id: row.get(0)?,
        name: row.get(1)?,
        status,
    })
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        account_number: row.get(0)?,
        investor_id: row.get(1)?,
        balance: row.get(2)?,
    })
}

fn row_to_holding(row: &rusqlite::Row<'_>) -> rusqlite::Result<Holding> {
    Ok(Holding {
        account_number: row.get(0)?,
        ticker: row.get(1)?,
        quantity: row.get(2)?,
        purchase_price: row.get(3)?,
    })
}

fn row_to_trade(row: &rusqlite::Row<'_>) -> rusqlite::Result<TradeRecord> {
    let side_text: String = row.get(3)?;
    let side = TradeSide::parse(&side_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown trade side: {side_text}").into(),
        )
    })?;
    let executed_text: String = row.get(6)?;
    let executed_at = DateTime::parse_from_rfc3339(&executed_text)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?
        .with_timezone(&Utc);
    Ok(TradeRecord {
        id: row.get(0)?,
        account_number: row.get(1)?,
        ticker: row.get(2)?,
        side,
        quantity: row.get(4)?,
        price: row.get(5)?,
        executed_at,
    })
}

impl InvestorStore for SqliteStore {
    fn list_investors(&self) -> Result<Vec<Investor>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT id, name, status FROM investor ORDER BY id")
            .map_err(Self::query_err)?;
        let rows = stmt.query_map([], row_to_investor).map_err(Self::query_err)?;

        let mut investors = Vec::new();
        for row in rows {
            investors.push(row.map_err(Self::query_err)?);
        }

        Ok(investors)
    }

    fn get_investor(&self, id: i64) -> Result<Investor, FoliobackError> {
        let conn = self.conn()?;

        match conn.query_row(
            "SELECT id, name, status FROM investor WHERE id = ?1",
            params![id],
            row_to_investor,
        ) {
            Ok(investor) => Ok(investor),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(FoliobackError::NotFound {
                entity: "investor",
                key: id.to_string(),
            }),
            Err(e) => Err(Self::query_err(e)),
        }
    }

    fn find_investors_by_name(&self, name: &str) -> Result<Vec<Investor>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT id, name, status FROM investor WHERE name = ?1 ORDER BY id")
            .map_err(Self::query_err)?;
        let rows = stmt
            .query_map(params![name], row_to_investor)
            .map_err(Self::query_err)?;

        let mut investors = Vec::new();
        for row in rows {
            investors.push(row.map_err(Self::query_err)?);
        }

        Ok(investors)
    }

    fn create_investor(&self, new: &NewInvestor) -> Result<Investor, FoliobackError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO investor (name, status) VALUES (?1, ?2)",
            params![new.name, new.status.as_str()],
        )
        .map_err(Self::query_err)?;

        Ok(Investor {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            status: new.status,
        })
    }

    fn update_investor(
        &self,
        id: i64,
        patch: &InvestorPatch,
    ) -> Result<Investor, FoliobackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Self::query_err)?;

        let current = match tx.query_row(
            "SELECT id, name, status FROM investor WHERE id = ?1",
            params![id],
            row_to_investor,
        ) {
            Ok(investor) => investor,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "investor",
                    key: id.to_string(),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let name = patch.name.clone().unwrap_or(current.name);
        let status = patch.status.unwrap_or(current.status);

        tx.execute(
            "UPDATE investor SET name = ?1, status = ?2 WHERE id = ?3",
            params![name, status.as_str(), id],
        )
        .map_err(Self::query_err)?;
        tx.commit().map_err(Self::query_err)?;

        Ok(Investor { id, name, status })
    }

    fn delete_investor(&self, id: i64) -> Result<(), FoliobackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Self::query_err)?;

        let dependents: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM account WHERE investor_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(Self::query_err)?;
        if dependents > 0 {
            return Err(FoliobackError::ConstraintViolation {
                reason: format!("investor {id} still owns {dependents} account(s)"),
            });
        }

        let deleted = tx
            .execute("DELETE FROM investor WHERE id = ?1", params![id])
            .map_err(Self::query_err)?;
        if deleted == 0 {
            return Err(FoliobackError::NotFound {
                entity: "investor",
                key: id.to_string(),
            });
        }
        tx.commit().map_err(Self::query_err)?;

        Ok(())
    }
}

impl AccountStore for SqliteStore {
    fn list_accounts(&self) -> Result<Vec<Account>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT account_number, investor_id, balance FROM account ORDER BY account_number")
            .map_err(Self::query_err)?;
        let rows = stmt.query_map([], row_to_account).map_err(Self::query_err)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row.map_err(Self::query_err)?);
        }

        Ok(accounts)
    }

    fn get_account(&self, account_number: i64) -> Result<Account, FoliobackError> {
        let conn = self.conn()?;

        match conn.query_row(
            "SELECT account_number, investor_id, balance FROM account WHERE account_number = ?1",
            params![account_number],
            row_to_account,
        ) {
            Ok(account) => Ok(account),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(FoliobackError::NotFound {
                entity: "account",
                key: account_number.to_string(),
            }),
            Err(e) => Err(Self::query_err(e)),
        }
    }

    fn accounts_for_investor(&self, investor_id: i64) -> Result<Vec<Account>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT account_number, investor_id, balance FROM account
                 WHERE investor_id = ?1 ORDER BY account_number",
            )
            .map_err(Self::query_err)?;
        let rows = stmt
            .query_map(params![investor_id], row_to_account)
            .map_err(Self::query_err)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row.map_err(Self::query_err)?);
        }

        Ok(accounts)
    }

    fn create_account(&self, new: &NewAccount) -> Result<Account, FoliobackError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO account (investor_id, balance) VALUES (?1, ?2)",
            params![new.investor_id, new.balance],
        )
        .map_err(Self::query_err)?;

        Ok(Account {
            account_number: conn.last_insert_rowid(),
            investor_id: new.investor_id,
            balance: new.balance,
        })
    }

    fn update_account(
        &self,
        account_number: i64,
        patch: &AccountPatch,
    ) -> Result<Account, FoliobackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Self::query_err)?;

        let current = match tx.query_row(
            "SELECT account_number, investor_id, balance FROM account WHERE account_number = ?1",
            params![account_number],
            row_to_account,
        ) {
            Ok(account) => account,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "account",
                    key: account_number.to_string(),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let balance = patch.balance.unwrap_or(current.balance);

        tx.execute(
            "UPDATE account SET balance = ?1 WHERE account_number = ?2",
            params![balance, account_number],
        )
        .map_err(Self::query_err)?;
        tx.commit().map_err(Self::query_err)?;

        Ok(Account {
            account_number,
            investor_id: current.investor_id,
            balance,
        })
    }

    fn delete_account(&self, account_number: i64) -> Result<(), FoliobackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Self::query_err)?;

        let dependents: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM portfolio WHERE account_number = ?1",
                params![account_number],
                |row| row.get(0),
            )
            .map_err(Self::query_err)?;
        if dependents > 0 {
            return Err(FoliobackError::ConstraintViolation {
                reason: format!(
                    "account {account_number} still holds {dependents} position(s)"
                ),
            });
        }

        let deleted = tx
            .execute(
                "DELETE FROM account WHERE account_number = ?1",
                params![account_number],
            )
            .map_err(Self::query_err)?;
        if deleted == 0 {
            return Err(FoliobackError::NotFound {
                entity: "account",
                key: account_number.to_string(),
            });
        }
        tx.commit().map_err(Self::query_err)?;

        Ok(())
    }
}

impl HoldingStore for SqliteStore {
    fn list_holdings(&self) -> Result<Vec<Holding>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT account_number, ticker, quantity, purchase_price FROM portfolio
                 ORDER BY account_number, ticker",
            )
            .map_err(Self::query_err)?;
        let rows = stmt.query_map([], row_to_holding).map_err(Self::query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(Self::query_err)?);
        }

        Ok(holdings)
    }

    fn get_holding(
        &self,
        account_number: i64,
        ticker: &str,
    ) -> Result<Holding, FoliobackError> {
        let conn = self.conn()?;

        match conn.query_row(
            "SELECT account_number, ticker, quantity, purchase_price FROM portfolio
             WHERE account_number = ?1 AND ticker = ?2",
            params![account_number, ticker],
            row_to_holding,
        ) {
            Ok(holding) => Ok(holding),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(FoliobackError::NotFound {
                entity: "holding",
                key: format!("{account_number}/{ticker}"),
            }),
            Err(e) => Err(Self::query_err(e)),
        }
    }

    fn holdings_for_account(
        &self,
        account_number: i64,
    ) -> Result<Vec<Holding>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT account_number, ticker, quantity, purchase_price FROM portfolio
                 WHERE account_number = ?1 ORDER BY ticker",
            )
            .map_err(Self::query_err)?;
        let rows = stmt
            .query_map(params![account_number], row_to_holding)
            .map_err(Self::query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(Self::query_err)?);
        }

        Ok(holdings)
    }

    fn holdings_for_investor(
        &self,
        investor_id: i64,
    ) -> Result<Vec<Holding>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT p.account_number, p.ticker, p.quantity, p.purchase_price
                 FROM portfolio p
                 INNER JOIN account a ON a.account_number = p.account_number
                 WHERE a.investor_id = ?1
                 ORDER BY p.account_number, p.ticker",
            )
            .map_err(Self::query_err)?;
        let rows = stmt
            .query_map(params![investor_id], row_to_holding)
            .map_err(Self::query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(Self::query_err)?);
        }

        Ok(holdings)
    }

    fn create_holding(&self, new: &NewHolding) -> Result<Holding, FoliobackError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO portfolio (account_number, ticker, quantity, purchase_price)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.account_number, new.ticker, new.quantity, new.purchase_price],
        )
        .map_err(Self::query_err)?;

        Ok(Holding {
            account_number: new.account_number,
            ticker: new.ticker.clone(),
            quantity: new.quantity,
            purchase_price: new.purchase_price,
        })
    }

    fn update_holding(
        &self,
        account_number: i64,
        ticker: &str,
        patch: &HoldingPatch,
    ) -> Result<Holding, FoliobackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(Self::query_err)?;

        let current = match tx.query_row(
            "SELECT account_number, ticker, quantity, purchase_price FROM portfolio
             WHERE account_number = ?1 AND ticker = ?2",
            params![account_number, ticker],
            row_to_holding,
        ) {
            Ok(holding) => holding,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "holding",
                    key: format!("{account_number}/{ticker}"),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let quantity = patch.quantity.unwrap_or(current.quantity);
        let purchase_price = patch.purchase_price.unwrap_or(current.purchase_price);

        tx.execute(
            "UPDATE portfolio SET quantity = ?1, purchase_price = ?2
             WHERE account_number = ?3 AND ticker = ?4",
            params![quantity, purchase_price, account_number, ticker],
        )
        .map_err(Self::query_err)?;
        tx.commit().map_err(Self::query_err)?;

        Ok(Holding {
            account_number,
            ticker: ticker.to_string(),
            quantity,
            purchase_price,
        })
    }

    fn delete_holding(
        &self,
        account_number: i64,
        ticker: &str,
    ) -> Result<(), FoliobackError> {
        let conn = self.conn()?;

        let deleted = conn
            .execute(
                "DELETE FROM portfolio WHERE account_number = ?1 AND ticker = ?2",
                params![account_number, ticker],
            )
            .map_err(Self::query_err)?;
        if deleted == 0 {
            return Err(FoliobackError::NotFound {
                entity: "holding",
                key: format!("{account_number}/{ticker}"),
            });
        }

        Ok(())
    }
}

impl TradePort for SqliteStore {
    fn settle_sale(&self, order: &SaleOrder) -> Result<SettlementResult, FoliobackError> {
        order.validate()?;

        let mut conn = self.conn()?;
        // Immediate transaction takes the write lock up front, so the
        // quantity read below cannot go stale before the updates commit.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Self::query_err)?;

        let held: i64 = match tx.query_row(
            "SELECT quantity FROM portfolio WHERE account_number = ?1 AND ticker = ?2",
            params![order.account_number, order.ticker],
            |row| row.get(0),
        ) {
            Ok(quantity) => quantity,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "holding",
                    key: format!("{}/{}", order.account_number, order.ticker),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let balance: f64 = match tx.query_row(
            "SELECT balance FROM account WHERE account_number = ?1",
            params![order.account_number],
            |row| row.get(0),
        ) {
            Ok(balance) => balance,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "account",
                    key: order.account_number.to_string(),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let (remaining, new_balance) = trade::apply_sale(order, held, balance)?;

        let holding_removed = remaining == 0;
        if holding_removed {
            tx.execute(
                "DELETE FROM portfolio WHERE account_number = ?1 AND ticker = ?2",
                params![order.account_number, order.ticker],
            )
            .map_err(Self::query_err)?;
        } else {
            tx.execute(
                "UPDATE portfolio SET quantity = ?1 WHERE account_number = ?2 AND ticker = ?3",
                params![remaining, order.account_number, order.ticker],
            )
            .map_err(Self::query_err)?;
        }

        tx.execute(
            "UPDATE account SET balance = ?1 WHERE account_number = ?2",
            params![new_balance, order.account_number],
        )
        .map_err(Self::query_err)?;

        tx.execute(
            "INSERT INTO trade_log (account_number, ticker, side, quantity, price, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.account_number,
                order.ticker,
                TradeSide::Sell.as_str(),
                order.quantity,
                order.price,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(Self::query_err)?;

        tx.commit().map_err(Self::query_err)?;

        Ok(SettlementResult {
            account_number: order.account_number,
            ticker: order.ticker.clone(),
            side: TradeSide::Sell,
            remaining_quantity: remaining,
            new_balance,
            holding_removed,
        })
    }

    fn settle_purchase(
        &self,
        order: &PurchaseOrder,
    ) -> Result<SettlementResult, FoliobackError> {
        order.validate()?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Self::query_err)?;

        let held: Option<i64> = match tx.query_row(
            "SELECT quantity FROM portfolio WHERE account_number = ?1 AND ticker = ?2",
            params![order.account_number, order.ticker],
            |row| row.get(0),
        ) {
            Ok(quantity) => Some(quantity),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(Self::query_err(e)),
        };

        let balance: f64 = match tx.query_row(
            "SELECT balance FROM account WHERE account_number = ?1",
            params![order.account_number],
            |row| row.get(0),
        ) {
            Ok(balance) => balance,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(FoliobackError::NotFound {
                    entity: "account",
                    key: order.account_number.to_string(),
                });
            }
            Err(e) => return Err(Self::query_err(e)),
        };

        let (new_quantity, new_balance) =
            trade::apply_purchase(order, held.unwrap_or(0), balance)?;

        if held.is_some() {
            tx.execute(
                "UPDATE portfolio SET quantity = ?1 WHERE account_number = ?2 AND ticker = ?3",
                params![new_quantity, order.account_number, order.ticker],
            )
            .map_err(Self::query_err)?;
        } else {
            // First purchase of this ticker fixes the cost basis.
            tx.execute(
                "INSERT INTO portfolio (account_number, ticker, quantity, purchase_price)
                 VALUES (?1, ?2, ?3, ?4)",
                params![order.account_number, order.ticker, new_quantity, order.price],
            )
            .map_err(Self::query_err)?;
        }

        tx.execute(
            "UPDATE account SET balance = ?1 WHERE account_number = ?2",
            params![new_balance, order.account_number],
        )
        .map_err(Self::query_err)?;

        tx.execute(
            "INSERT INTO trade_log (account_number, ticker, side, quantity, price, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                order.account_number,
                order.ticker,
                TradeSide::Buy.as_str(),
                order.quantity,
                order.price,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(Self::query_err)?;

        tx.commit().map_err(Self::query_err)?;

        Ok(SettlementResult {
            account_number: order.account_number,
            ticker: order.ticker.clone(),
            side: TradeSide::Buy,
            remaining_quantity: new_quantity,
            new_balance,
            holding_removed: false,
        })
    }

    fn list_trades(&self) -> Result<Vec<TradeRecord>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, account_number, ticker, side, quantity, price, executed_at
                 FROM trade_log ORDER BY id",
            )
            .map_err(Self::query_err)?;
        let rows = stmt.query_map([], row_to_trade).map_err(Self::query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(Self::query_err)?);
        }

        Ok(trades)
    }

    fn trades_for_account(
        &self,
        account_number: i64,
    ) -> Result<Vec<TradeRecord>, FoliobackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, account_number, ticker, side, quantity, price, executed_at
                 FROM trade_log WHERE account_number = ?1 ORDER BY id",
            )
            .map_err(Self::query_err)?;
        let rows = stmt
            .query_map(params![account_number], row_to_trade)
            .map_err(Self::query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(Self::query_err)?);
        }

        Ok(trades)
    }
}
