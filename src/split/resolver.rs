use crate::core::currency::{CurrencyCode, CurrencyError, CurrencyNormalizer};
use crate::core::member::MemberId;
use crate::core::money::Money;
use crate::core::record::{ExpenseRecord, SettlementRecord, SplitStrategy};
use crate::split::rounding::{distribute, even_weights};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while expanding a record into shares.
///
/// Malformed split definitions are rejected here, never coerced into
/// something that happens to add up.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Currency(#[from] CurrencyError),
    #[error("exact shares sum to {actual}, expected the record total {expected}")]
    ExactSumMismatch { expected: Money, actual: Money },
    #[error("paid amounts sum to {actual}, expected the record total {expected}")]
    PaidSumMismatch { expected: Money, actual: Money },
    #[error("split names no participants")]
    NoParticipants,
    #[error("percentages sum to {0}, expected exactly 100")]
    PercentageSum(Decimal),
    #[error("share weights sum to zero")]
    ZeroWeightTotal,
    #[error("negative percentage {value} for {member}")]
    NegativePercentage { member: MemberId, value: Decimal },
    #[error("negative amount {amount} for {member}")]
    NegativeAmount { member: MemberId, amount: Money },
}

/// The resolved form of one record: who is credited and who owes, in base
/// minor units.
///
/// Both sides sum exactly to the normalized record total. The net effect
/// on a member who both paid and owes is the algebraic sum of the two
/// sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    record: Uuid,
    paid: BTreeMap<MemberId, Money>,
    owed: BTreeMap<MemberId, Money>,
}

impl Split {
    /// The id of the record this split was expanded from.
    pub fn record(&self) -> Uuid {
        self.record
    }

    /// Credited amounts per payer. Sums to the normalized total.
    pub fn paid(&self) -> &BTreeMap<MemberId, Money> {
        &self.paid
    }

    /// Owed amounts per member. Sums to the normalized total.
    pub fn owed(&self) -> &BTreeMap<MemberId, Money> {
        &self.owed
    }

    /// The normalized record total in base minor units.
    pub fn total(&self) -> Money {
        self.owed.values().sum()
    }

    /// Signed per-member effect: positive means the member owes, negative
    /// means the member is owed. Always sums to zero.
    pub fn net_effects(&self) -> BTreeMap<MemberId, Money> {
        let mut effects: BTreeMap<MemberId, Money> = BTreeMap::new();
        for (member, amount) in &self.owed {
            *effects.entry(member.clone()).or_default() += *amount;
        }
        for (member, amount) in &self.paid {
            *effects.entry(member.clone()).or_default() -= *amount;
        }
        effects
    }
}

/// Expands ledger records into exact per-member shares.
///
/// Resolution is a pure function of the record: the record's total is
/// normalized into base minor units exactly once, and both the paid and
/// owed sides are carved out of that integer total with the shared
/// largest-remainder routine. No rounding ever leaks a minor unit, and
/// re-resolving the same record always produces the identical split.
///
/// # Examples
///
/// ```
/// use splitledger::core::currency::CurrencyCode;
/// use splitledger::core::member::{GroupId, MemberId};
/// use splitledger::core::money::Money;
/// use splitledger::core::record::{ExpenseRecord, SplitStrategy};
/// use splitledger::split::resolver::SplitResolver;
///
/// let resolver = SplitResolver::new(CurrencyCode::new("USD"));
/// let dinner = ExpenseRecord::new(
///     GroupId::new("trip"),
///     [(MemberId::new("alice"), Money::from_minor(9000))].into(),
///     Money::from_minor(9000),
///     CurrencyCode::new("USD"),
///     SplitStrategy::Equal {
///         among: vec![MemberId::new("alice"), MemberId::new("bob"), MemberId::new("carol")],
///     },
/// );
///
/// let split = resolver.resolve(&dinner).unwrap();
/// assert_eq!(split.owed()[&MemberId::new("bob")], Money::from_minor(3000));
/// assert_eq!(split.net_effects()[&MemberId::new("alice")], Money::from_minor(-6000));
/// ```
#[derive(Debug, Clone)]
pub struct SplitResolver {
    normalizer: CurrencyNormalizer,
}

impl SplitResolver {
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            normalizer: CurrencyNormalizer::new(base),
        }
    }

    pub fn normalizer(&self) -> &CurrencyNormalizer {
        &self.normalizer
    }

    /// Expand one expense into its paid and owed sides.
    pub fn resolve(&self, record: &ExpenseRecord) -> Result<Split, SplitError> {
        let paid_total: Money = record.paid_by().values().sum();
        for (member, amount) in record.paid_by() {
            if amount.is_negative() {
                return Err(SplitError::NegativeAmount {
                    member: member.clone(),
                    amount: *amount,
                });
            }
        }
        if paid_total != record.total() {
            return Err(SplitError::PaidSumMismatch {
                expected: record.total(),
                actual: paid_total,
            });
        }

        let base_total =
            self.normalizer
                .normalize(record.total(), record.currency(), record.fx_rate())?;

        let paid_weights: BTreeMap<MemberId, Decimal> = record
            .paid_by()
            .iter()
            .map(|(m, amount)| (m.clone(), Decimal::from(amount.minor())))
            .collect();
        let paid = distribute(base_total, &paid_weights);

        let owed_weights = self.owed_weights(record)?;
        let owed = distribute(base_total, &owed_weights);

        Ok(Split {
            record: record.id(),
            paid,
            owed,
        })
    }

    /// Expand a settlement: the payer is credited, the receiver owes.
    pub fn resolve_settlement(&self, record: &SettlementRecord) -> Result<Split, SplitError> {
        let base_amount =
            self.normalizer
                .normalize(record.amount(), record.currency(), record.fx_rate())?;
        Ok(Split {
            record: record.id(),
            paid: [(record.from().clone(), base_amount)].into(),
            owed: [(record.to().clone(), base_amount)].into(),
        })
    }

    /// Validate the strategy inputs and turn them into distribution weights.
    fn owed_weights(
        &self,
        record: &ExpenseRecord,
    ) -> Result<BTreeMap<MemberId, Decimal>, SplitError> {
        match record.split() {
            SplitStrategy::Equal { among } => {
                if among.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                // Duplicate entries collapse to a single share.
                Ok(even_weights(among))
            }
            SplitStrategy::Percentage { shares } => {
                if shares.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                for (member, value) in shares {
                    if *value < Decimal::ZERO {
                        return Err(SplitError::NegativePercentage {
                            member: member.clone(),
                            value: *value,
                        });
                    }
                }
                let sum: Decimal = shares.values().copied().sum();
                if sum != Decimal::ONE_HUNDRED {
                    return Err(SplitError::PercentageSum(sum));
                }
                Ok(shares.clone())
            }
            SplitStrategy::Exact { amounts } => {
                if amounts.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                for (member, amount) in amounts {
                    if amount.is_negative() {
                        return Err(SplitError::NegativeAmount {
                            member: member.clone(),
                            amount: *amount,
                        });
                    }
                }
                let sum: Money = amounts.values().sum();
                if sum != record.total() {
                    return Err(SplitError::ExactSumMismatch {
                        expected: record.total(),
                        actual: sum,
                    });
                }
                Ok(amounts
                    .iter()
                    .map(|(m, amount)| (m.clone(), Decimal::from(amount.minor())))
                    .collect())
            }
            SplitStrategy::Shares { weights } => {
                if weights.is_empty() {
                    return Err(SplitError::NoParticipants);
                }
                if weights.values().all(|w| *w == 0) {
                    return Err(SplitError::ZeroWeightTotal);
                }
                Ok(weights
                    .iter()
                    .map(|(m, w)| (m.clone(), Decimal::from(*w)))
                    .collect())
            }
        }
    }
}
