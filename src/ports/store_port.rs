//! Record store port traits: one CRUD surface per entity.
//!
//! Every operation returns a typed result; a missing record is always a
//! `NotFound` error, never an empty success.

use crate::domain::account::{Account, AccountPatch, NewAccount};
use crate::domain::error::FoliobackError;
use crate::domain::holding::{Holding, HoldingPatch, NewHolding};
use crate::domain::investor::{Investor, InvestorPatch, NewInvestor};
use crate::ports::trade_port::TradePort;

pub trait InvestorStore {
    fn list_investors(&self) -> Result<Vec<Investor>, FoliobackError>;

    fn get_investor(&self, id: i64) -> Result<Investor, FoliobackError>;

    fn find_investors_by_name(&self, name: &str) -> Result<Vec<Investor>, FoliobackError>;

    /// Persists a new investor and returns the stored row with its id.
    fn create_investor(&self, new: &NewInvestor) -> Result<Investor, FoliobackError>;

    fn update_investor(
        &self,
        id: i64,
        patch: &InvestorPatch,
    ) -> Result<Investor, FoliobackError>;

    /// Fails `ConstraintViolation` while accounts still reference the
    /// investor; there is no cascade.
    fn delete_investor(&self, id: i64) -> Result<(), FoliobackError>;
}

pub trait AccountStore {
    fn list_accounts(&self) -> Result<Vec<Account>, FoliobackError>;

    fn get_account(&self, account_number: i64) -> Result<Account, FoliobackError>;

    fn accounts_for_investor(&self, investor_id: i64) -> Result<Vec<Account>, FoliobackError>;

    /// Fails `ConstraintViolation` when the owning investor does not exist.
    fn create_account(&self, new: &NewAccount) -> Result<Account, FoliobackError>;

    fn update_account(
        &self,
        account_number: i64,
        patch: &AccountPatch,
    ) -> Result<Account, FoliobackError>;

    /// Fails `ConstraintViolation` while holdings remain in the account.
    fn delete_account(&self, account_number: i64) -> Result<(), FoliobackError>;
}

pub trait HoldingStore {
    fn list_holdings(&self) -> Result<Vec<Holding>, FoliobackError>;

    fn get_holding(&self, account_number: i64, ticker: &str)
        -> Result<Holding, FoliobackError>;

    fn holdings_for_account(&self, account_number: i64)
        -> Result<Vec<Holding>, FoliobackError>;

    /// Holdings across every account owned by the investor.
    fn holdings_for_investor(&self, investor_id: i64)
        -> Result<Vec<Holding>, FoliobackError>;

    /// Fails `ConstraintViolation` when the account does not exist or the
    /// (account, ticker) pair is already held.
    fn create_holding(&self, new: &NewHolding) -> Result<Holding, FoliobackError>;

    fn update_holding(
        &self,
        account_number: i64,
        ticker: &str,
        patch: &HoldingPatch,
    ) -> Result<Holding, FoliobackError>;

    fn delete_holding(&self, account_number: i64, ticker: &str)
        -> Result<(), FoliobackError>;
}

/// The full storage surface the web adapter is wired against.
pub trait RecordStore: InvestorStore + AccountStore + HoldingStore + TradePort {}

impl<T: InvestorStore + AccountStore + HoldingStore + TradePort> RecordStore for T {}
