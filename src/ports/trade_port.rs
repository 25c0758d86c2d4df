//! Trade settlement port trait.

use crate::domain::error::FoliobackError;
use crate::domain::trade::{PurchaseOrder, SaleOrder, SettlementResult, TradeRecord};

/// Settlement applies a trade's share and cash effects as one atomic
/// unit: either both records (and the trade-log row) change, or none do.
pub trait TradePort {
    /// Sell shares: decrement the holding, credit the account, log the
    /// trade. A holding emptied by the sale is removed.
    fn settle_sale(&self, order: &SaleOrder) -> Result<SettlementResult, FoliobackError>;

    /// Buy shares: create or top up the holding, debit the account, log
    /// the trade.
    fn settle_purchase(
        &self,
        order: &PurchaseOrder,
    ) -> Result<SettlementResult, FoliobackError>;

    fn list_trades(&self) -> Result<Vec<TradeRecord>, FoliobackError>;

    fn trades_for_account(&self, account_number: i64)
        -> Result<Vec<TradeRecord>, FoliobackError>;
}
