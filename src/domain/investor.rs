//! Investor records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestorStatus {
    #[default]
    Active,
    Inactive,
}

impl InvestorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorStatus::Active => "active",
            InvestorStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(InvestorStatus::Active),
            "inactive" => Some(InvestorStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: i64,
    pub name: String,
    pub status: InvestorStatus,
}

impl Investor {
    pub fn is_active(&self) -> bool {
        self.status == InvestorStatus::Active
    }
}

/// Fields for creating an investor; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvestor {
    pub name: String,
    #[serde(default)]
    pub status: InvestorStatus,
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestorPatch {
    pub name: Option<String>,
    pub status: Option<InvestorStatus>,
}

impl InvestorPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_round_trip() {
        for status in [InvestorStatus::Active, InvestorStatus::Inactive] {
            assert_eq!(InvestorStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(InvestorStatus::parse("retired"), None);
        assert_eq!(InvestorStatus::parse("Active"), None);
    }

    #[test]
    fn default_status_is_active() {
        assert_eq!(InvestorStatus::default(), InvestorStatus::Active);
    }

    #[test]
    fn empty_patch() {
        assert!(InvestorPatch::default().is_empty());
        let patch = InvestorPatch {
            name: Some("Sam".into()),
            status: None,
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn is_active() {
        let investor = Investor {
            id: 1,
            name: "Sam".into(),
            status: InvestorStatus::Active,
        };
        assert!(investor.is_active());
    }
}
