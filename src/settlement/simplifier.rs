use crate::balance::matrix::BalanceMatrix;
use crate::core::member::MemberId;
use crate::core::money::Money;
use crate::settlement::plan::{SettlementPlan, Transaction};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use thiserror::Error;

/// Errors arising from settlement simplification.
#[derive(Debug, Error)]
pub enum SettleError {
    /// Net positions do not sum to zero. Balances produced by the fold
    /// always do, so this is an upstream data bug — it is surfaced,
    /// never papered over.
    #[error("net positions sum to {residual}, expected exactly zero")]
    Unbalanced { residual: Money },
}

/// Computes a minimal transfer plan from net balances.
///
/// Greedy max/max matching: repeatedly pair the member with the largest
/// outstanding debt against the member with the largest outstanding
/// credit, transfer the smaller of the two, and push the remainder back.
/// Each step fully clears at least one member, which bounds the plan at
/// `N − 1` transactions for `N` members with nonzero position.
///
/// Ties in magnitude break to the ascending member id, so the output is
/// fully deterministic.
pub struct SettlementSimplifier;

impl SettlementSimplifier {
    /// Simplify a folded balance matrix into a transfer plan.
    pub fn simplify(matrix: &BalanceMatrix) -> Result<SettlementPlan, SettleError> {
        Self::simplify_positions(&matrix.positions())
    }

    /// Simplify raw scalar positions (positive = creditor).
    pub fn simplify_positions(
        positions: &BTreeMap<MemberId, Money>,
    ) -> Result<SettlementPlan, SettleError> {
        let residual: Money = positions.values().sum();
        if !residual.is_zero() {
            return Err(SettleError::Unbalanced { residual });
        }

        // Max-heaps keyed (amount, Reverse(member)): equal amounts resolve
        // to the smallest member id.
        let mut creditors: BinaryHeap<(Money, Reverse<MemberId>)> = positions
            .iter()
            .filter(|(_, p)| p.is_positive())
            .map(|(m, p)| (*p, Reverse(m.clone())))
            .collect();
        let mut debtors: BinaryHeap<(Money, Reverse<MemberId>)> = positions
            .iter()
            .filter(|(_, p)| p.is_negative())
            .map(|(m, p)| (p.abs(), Reverse(m.clone())))
            .collect();

        let mut transactions = Vec::new();
        while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
            (creditors.pop(), debtors.pop())
        {
            let amount = credit.min(debt);
            transactions.push(Transaction {
                from: debtor.clone(),
                to: creditor.clone(),
                amount,
            });

            let credit_left = credit - amount;
            if credit_left.is_positive() {
                creditors.push((credit_left, Reverse(creditor)));
            }
            let debt_left = debt - amount;
            if debt_left.is_positive() {
                debtors.push((debt_left, Reverse(debtor)));
            }
        }
        // Zero-sum input guarantees both sides exhaust together.
        debug_assert!(creditors.is_empty() && debtors.is_empty());

        Ok(SettlementPlan::new(transactions))
    }
}
