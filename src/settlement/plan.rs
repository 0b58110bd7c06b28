use crate::core::member::MemberId;
use crate::core::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One transfer of a settlement plan: `from` pays `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}: {}", self.from, self.to, self.amount)
    }
}

/// An ordered list of transfers that zeroes every member's net position.
///
/// For `N` members with a nonzero position the plan holds at most `N − 1`
/// transactions — the whole point of simplification, since reporting every
/// nonzero pairwise balance as a required payment would be correct but far
/// from minimal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementPlan {
    transactions: Vec<Transaction>,
}

impl SettlementPlan {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Total amount moved by the plan.
    pub fn total_volume(&self) -> Money {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Apply every transfer to a set of scalar positions. A debtor paying
    /// moves their position up; a creditor receiving moves theirs down.
    pub fn apply(&self, positions: &mut BTreeMap<MemberId, Money>) {
        for t in &self.transactions {
            *positions.entry(t.from.clone()).or_default() += t.amount;
            *positions.entry(t.to.clone()).or_default() -= t.amount;
        }
    }

    /// How much shorter the plan is than paying off every pairwise balance
    /// individually, as a percentage of the pairwise count.
    pub fn reduction_percent(&self, pairwise_count: usize) -> f64 {
        if pairwise_count == 0 {
            return 0.0;
        }
        let saved = pairwise_count.saturating_sub(self.transactions.len());
        saved as f64 * 100.0 / pairwise_count as f64
    }
}

impl fmt::Display for SettlementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Settlement Plan ===")?;
        writeln!(f, "Transfers:    {}", self.len())?;
        writeln!(f, "Total moved:  {}", self.total_volume())?;
        for t in &self.transactions {
            writeln!(f, "  {}", t)?;
        }
        Ok(())
    }
}
