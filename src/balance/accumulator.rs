use crate::balance::matrix::BalanceMatrix;
use crate::core::member::MemberId;
use crate::core::money::Money;
use crate::split::resolver::Split;
use crate::split::rounding::distribute;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Folds resolved history into a pairwise balance matrix.
///
/// The fold is associative and commutative: applying the same set of
/// splits in any order yields the identical matrix. That property is what
/// makes retroactive edits safe — recomputation is always a full replay of
/// the surviving history, never a patch on top of drifting running totals.
pub struct BalanceAccumulator;

impl BalanceAccumulator {
    /// Fold a sequence of splits into a balance matrix.
    pub fn fold<'a, I>(splits: I) -> BalanceMatrix
    where
        I: IntoIterator<Item = &'a Split>,
    {
        let mut matrix = BalanceMatrix::new();
        for split in splits {
            Self::apply(&mut matrix, split);
        }
        matrix
    }

    /// Apply one split: every owed share becomes debt toward the payers,
    /// attributed proportionally to what each payer covered.
    pub fn apply(matrix: &mut BalanceMatrix, split: &Split) {
        let payer_weights: BTreeMap<MemberId, Decimal> = split
            .paid()
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(m, amount)| (m.clone(), Decimal::from(amount.minor())))
            .collect();
        if payer_weights.is_empty() {
            return;
        }

        for (debtor, share) in split.owed() {
            if share.is_zero() {
                continue;
            }
            let portions = distribute(*share, &payer_weights);
            for (payer, portion) in portions {
                // A payer owing their own expense nets out; no self-edge.
                matrix.add_debt(&payer, debtor, portion);
            }
        }
    }
}
