//! Account records.

use serde::{Deserialize, Serialize};

/// A cash account owned by an investor. `balance` is the sum of all
/// settled cash movements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: i64,
    pub investor_id: i64,
    pub balance: f64,
}

/// Fields for opening an account; the store assigns the account number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub investor_id: i64,
    #[serde(default)]
    pub balance: f64,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPatch {
    pub balance: Option<f64>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.balance.is_none()
    }
}
