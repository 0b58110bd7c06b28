//! Random group-history generation.
//!
//! Builds ledgers with arbitrary rosters, split strategies and
//! multi-currency records to exercise the fold and simplifier under
//! volume.

use crate::core::currency::CurrencyCode;
use crate::core::ledger::GroupLedger;
use crate::core::member::{GroupId, MemberId};
use crate::core::money::Money;
use crate::core::record::{ExpenseRecord, SettlementRecord, SplitStrategy};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Configuration for generating a random group history.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Number of members in the group.
    pub member_count: usize,
    /// Number of expense records to generate.
    pub expense_count: usize,
    /// Number of settlement records to generate.
    pub settlement_count: usize,
    /// Foreign currencies and their captured rates into the base.
    pub foreign_currencies: Vec<(CurrencyCode, Decimal)>,
    /// Base currency of the group.
    pub base_currency: CurrencyCode,
    /// Minimum expense total in minor units.
    pub min_amount: i64,
    /// Maximum expense total in minor units.
    pub max_amount: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            member_count: 6,
            expense_count: 20,
            settlement_count: 3,
            foreign_currencies: Vec::new(),
            base_currency: CurrencyCode::new("USD"),
            min_amount: 100,
            max_amount: 100_000,
        }
    }
}

/// Generate a random group ledger for testing.
pub fn generate_random_history(config: &HistoryConfig) -> GroupLedger {
    let mut rng = rand::thread_rng();
    let group = GroupId::new("stress");
    let mut ledger = GroupLedger::new(group.clone(), config.base_currency.clone());

    let members: Vec<MemberId> = (0..config.member_count)
        .map(|i| MemberId::new(format!("member-{:03}", i)))
        .collect();
    for member in &members {
        ledger.add_member(member.clone());
    }

    for _ in 0..config.expense_count {
        let total = Money::from_minor(rng.gen_range(config.min_amount..=config.max_amount));
        let participants = random_subset(&mut rng, &members, 2);
        let payers = random_subset(&mut rng, &members, 1);
        let paid_by = random_partition(&mut rng, total, &payers);

        let split = match rng.gen_range(0..4) {
            0 => SplitStrategy::Equal {
                among: participants.clone(),
            },
            1 => {
                let percents = random_partition(&mut rng, Money::from_minor(100), &participants);
                SplitStrategy::Percentage {
                    shares: percents
                        .into_iter()
                        .map(|(m, p)| (m, Decimal::from(p.minor())))
                        .collect(),
                }
            }
            2 => SplitStrategy::Exact {
                amounts: random_partition(&mut rng, total, &participants),
            },
            _ => SplitStrategy::Shares {
                weights: participants
                    .iter()
                    .map(|m| (m.clone(), rng.gen_range(1..=5)))
                    .collect(),
            },
        };

        let currency = pick_currency(&mut rng, config);
        let mut record = ExpenseRecord::new(group.clone(), paid_by, total, currency, split);
        if let Some(rate) = rate_for(record.currency(), config) {
            record = record.with_rate(rate);
        }
        ledger.record_expense(record);
    }

    for _ in 0..config.settlement_count {
        if members.len() < 2 {
            break;
        }
        let pair = random_subset(&mut rng, &members, 2);
        let amount = Money::from_minor(rng.gen_range(config.min_amount..=config.max_amount));
        ledger.record_settlement(SettlementRecord::new(
            group.clone(),
            pair[0].clone(),
            pair[1].clone(),
            amount,
            config.base_currency.clone(),
        ));
    }

    ledger
}

fn pick_currency(rng: &mut impl Rng, config: &HistoryConfig) -> CurrencyCode {
    if config.foreign_currencies.is_empty() || rng.gen_bool(0.5) {
        config.base_currency.clone()
    } else {
        let idx = rng.gen_range(0..config.foreign_currencies.len());
        config.foreign_currencies[idx].0.clone()
    }
}

fn rate_for(currency: &CurrencyCode, config: &HistoryConfig) -> Option<Decimal> {
    config
        .foreign_currencies
        .iter()
        .find(|(c, _)| c == currency)
        .map(|(_, rate)| *rate)
}

/// A shuffled subset of at least `min` members.
fn random_subset(rng: &mut impl Rng, members: &[MemberId], min: usize) -> Vec<MemberId> {
    let min = min.min(members.len());
    let count = rng.gen_range(min..=members.len());
    let mut pool: Vec<MemberId> = members.to_vec();
    pool.shuffle(rng);
    pool.truncate(count.max(1));
    pool
}

/// Split `total` into random per-member amounts that sum exactly to it.
fn random_partition(
    rng: &mut impl Rng,
    total: Money,
    members: &[MemberId],
) -> BTreeMap<MemberId, Money> {
    let mut amounts: BTreeMap<MemberId, Money> = BTreeMap::new();
    let mut remaining = total.minor();
    for (i, member) in members.iter().enumerate() {
        let amount = if i + 1 == members.len() {
            remaining
        } else {
            rng.gen_range(0..=remaining)
        };
        amounts.insert(member.clone(), Money::from_minor(amount));
        remaining -= amount;
    }
    amounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::engine::LedgerService;
    use rust_decimal_macros::dec;

    #[test]
    fn test_generated_history_folds_cleanly() {
        let config = HistoryConfig {
            member_count: 8,
            expense_count: 30,
            settlement_count: 5,
            foreign_currencies: vec![(CurrencyCode::new("EUR"), dec!(1.08))],
            ..Default::default()
        };

        let ledger = generate_random_history(&config);
        let report = LedgerService::compute(&ledger.snapshot()).unwrap();

        let sum: Money = report.positions.values().sum();
        assert_eq!(sum, Money::ZERO);

        let nonzero = report.positions.values().filter(|p| !p.is_zero()).count();
        assert!(report.plan.len() <= nonzero.saturating_sub(1));
    }

    #[test]
    fn test_partition_sums_exactly() {
        let mut rng = rand::thread_rng();
        let members: Vec<MemberId> = (0..5).map(|i| MemberId::new(format!("m{}", i))).collect();
        for _ in 0..50 {
            let total = Money::from_minor(rng.gen_range(1..100_000));
            let parts = random_partition(&mut rng, total, &members);
            let sum: Money = parts.values().sum();
            assert_eq!(sum, total);
        }
    }

    #[test]
    fn test_generated_plan_settles_the_group() {
        let ledger = generate_random_history(&HistoryConfig::default());
        let report = LedgerService::compute(&ledger.snapshot()).unwrap();

        let mut positions = report.positions.clone();
        report.plan.apply(&mut positions);
        assert!(positions.values().all(|p| p.is_zero()));
    }
}
