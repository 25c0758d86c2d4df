//! Trade orders and settlement arithmetic.
//!
//! The functions here are pure: the storage adapter reads the current
//! holding and balance inside its transaction, applies [`apply_sale`] or
//! [`apply_purchase`], and persists the result. Keeping the arithmetic out
//! of the adapter lets the sufficiency checks be tested without a database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FoliobackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// A request to sell `quantity` shares of `ticker` out of an account at
/// `price` per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOrder {
    pub account_number: i64,
    pub ticker: String,
    pub quantity: i64,
    pub price: f64,
}

impl SaleOrder {
    pub fn validate(&self) -> Result<(), FoliobackError> {
        validate_order(&self.ticker, self.quantity, self.price)
    }
}

/// A request to buy `quantity` shares of `ticker` into an account at
/// `price` per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub account_number: i64,
    pub ticker: String,
    pub quantity: i64,
    pub price: f64,
}

impl PurchaseOrder {
    pub fn validate(&self) -> Result<(), FoliobackError> {
        validate_order(&self.ticker, self.quantity, self.price)
    }
}

fn validate_order(ticker: &str, quantity: i64, price: f64) -> Result<(), FoliobackError> {
    if ticker.trim().is_empty() {
        return Err(FoliobackError::InvalidOrder {
            reason: "ticker must not be empty".into(),
        });
    }
    if quantity <= 0 {
        return Err(FoliobackError::InvalidOrder {
            reason: format!("quantity must be positive, got {quantity}"),
        });
    }
    if price < 0.0 || !price.is_finite() {
        return Err(FoliobackError::InvalidOrder {
            reason: format!("price must be a non-negative number, got {price}"),
        });
    }
    Ok(())
}

/// Outcome of a settled trade: the holding quantity and account balance
/// after both writes committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub account_number: i64,
    pub ticker: String,
    pub side: TradeSide,
    pub remaining_quantity: i64,
    pub new_balance: f64,
    /// True when the sale emptied the holding and its row was removed.
    pub holding_removed: bool,
}

/// Append-only trade log row, written in the same transaction as the
/// settlement it records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    pub account_number: i64,
    pub ticker: String,
    pub side: TradeSide,
    pub quantity: i64,
    pub price: f64,
    pub executed_at: DateTime<Utc>,
}

/// Compute the post-sale holding quantity and account balance.
///
/// Fails `InsufficientHoldings` when the order asks for more shares than
/// held; in that case nothing may be written.
pub fn apply_sale(
    order: &SaleOrder,
    held: i64,
    balance: f64,
) -> Result<(i64, f64), FoliobackError> {
    let remaining = held - order.quantity;
    if remaining < 0 {
        return Err(FoliobackError::InsufficientHoldings {
            ticker: order.ticker.clone(),
            held,
            requested: order.quantity,
        });
    }
    let proceeds = order.quantity as f64 * order.price;
    Ok((remaining, balance + proceeds))
}

/// Compute the post-purchase holding quantity and account balance.
///
/// Fails `InsufficientFunds` when the account cannot cover the order.
pub fn apply_purchase(
    order: &PurchaseOrder,
    held: i64,
    balance: f64,
) -> Result<(i64, f64), FoliobackError> {
    let cost = order.quantity as f64 * order.price;
    let new_balance = balance - cost;
    if new_balance < 0.0 {
        return Err(FoliobackError::InsufficientFunds {
            account: order.account_number,
            balance,
            required: cost,
        });
    }
    Ok((held + order.quantity, new_balance))
}
