//! Portfolio holdings: shares of one ticker owned by one account.

use serde::{Deserialize, Serialize};

/// Identity is the (`account_number`, `ticker`) pair. `quantity` never
/// goes negative; `purchase_price` is the reference cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub account_number: i64,
    pub ticker: String,
    pub quantity: i64,
    pub purchase_price: f64,
}

impl Holding {
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.purchase_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHolding {
    pub account_number: i64,
    pub ticker: String,
    pub quantity: i64,
    pub purchase_price: f64,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingPatch {
    pub quantity: Option<i64>,
    pub purchase_price: Option<f64>,
}

impl HoldingPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.purchase_price.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_holding() -> Holding {
        Holding {
            account_number: 1,
            ticker: "BHP".into(),
            quantity: 100,
            purchase_price: 50.0,
        }
    }

    #[test]
    fn cost_basis() {
        let holding = sample_holding();
        assert!((holding.cost_basis() - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn market_value_at_current_price() {
        let holding = sample_holding();
        assert!((holding.market_value(55.0) - 5500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_patch() {
        assert!(HoldingPatch::default().is_empty());
        assert!(
            !HoldingPatch {
                quantity: Some(10),
                purchase_price: None
            }
            .is_empty()
        );
    }
}
