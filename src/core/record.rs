use crate::core::currency::CurrencyCode;
use crate::core::member::{GroupId, MemberId};
use crate::core::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How an expense's total is divided into per-member owed amounts.
///
/// Each variant carries its own validated input shape; validation happens
/// when the record is expanded into shares, not at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Total divided evenly among the listed members; leftover minor units
    /// go to the lowest member ids.
    Equal { among: Vec<MemberId> },
    /// Per-member percentages of the total. Must sum to exactly 100.
    Percentage { shares: BTreeMap<MemberId, Decimal> },
    /// Caller-supplied per-member amounts in the record's currency.
    /// Must sum to exactly the record total.
    Exact { amounts: BTreeMap<MemberId, Money> },
    /// Total divided proportionally to integer weights.
    Shares { weights: BTreeMap<MemberId, u32> },
}

/// One shared expense: who paid, how much, and how it splits.
///
/// Records are immutable once created. An edit appends a new version
/// carrying `replaces: Some(old_id)`; a deletion appends a retraction
/// entry to the ledger. The old version is never mutated, so balances can
/// always be recomputed by replaying the surviving history.
///
/// # Examples
///
/// ```
/// use splitledger::core::currency::CurrencyCode;
/// use splitledger::core::member::{GroupId, MemberId};
/// use splitledger::core::money::Money;
/// use splitledger::core::record::{ExpenseRecord, SplitStrategy};
///
/// let dinner = ExpenseRecord::new(
///     GroupId::new("ski-trip"),
///     [(MemberId::new("alice"), Money::from_minor(9000))].into(),
///     Money::from_minor(9000),
///     CurrencyCode::new("USD"),
///     SplitStrategy::Equal {
///         among: vec![MemberId::new("alice"), MemberId::new("bob"), MemberId::new("carol")],
///     },
/// );
/// assert_eq!(dinner.total(), Money::from_minor(9000));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Unique identifier for this record version.
    id: Uuid,
    /// The group this expense belongs to.
    group: GroupId,
    /// Who covered the expense and how much each paid, in `currency`.
    paid_by: BTreeMap<MemberId, Money>,
    /// The full expense amount, in `currency`. Must be positive.
    total: Money,
    /// The currency the expense was recorded in.
    currency: CurrencyCode,
    /// Exchange rate into the group's base currency, captured at creation.
    /// `None` for base-currency records.
    fx_rate: Option<Decimal>,
    /// How the total divides into owed shares.
    split: SplitStrategy,
    /// When this record was created.
    created_at: DateTime<Utc>,
    /// The record version this one supersedes, if it is an edit.
    replaces: Option<Uuid>,
    /// Optional free-form category label.
    category: Option<String>,
}

impl ExpenseRecord {
    /// Create a new expense record.
    ///
    /// # Panics
    ///
    /// Panics if `total` is not positive or `paid_by` is empty.
    pub fn new(
        group: GroupId,
        paid_by: BTreeMap<MemberId, Money>,
        total: Money,
        currency: CurrencyCode,
        split: SplitStrategy,
    ) -> Self {
        assert!(
            total.is_positive(),
            "Expense total must be positive, got {}",
            total
        );
        assert!(!paid_by.is_empty(), "Expense needs at least one payer");
        Self {
            id: Uuid::new_v4(),
            group,
            paid_by,
            total,
            currency,
            fx_rate: None,
            split,
            created_at: Utc::now(),
            replaces: None,
            category: None,
        }
    }

    /// Create a record with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        group: GroupId,
        paid_by: BTreeMap<MemberId, Money>,
        total: Money,
        currency: CurrencyCode,
        split: SplitStrategy,
    ) -> Self {
        assert!(total.is_positive());
        assert!(!paid_by.is_empty());
        Self {
            id,
            group,
            paid_by,
            total,
            currency,
            fx_rate: None,
            split,
            created_at: Utc::now(),
            replaces: None,
            category: None,
        }
    }

    /// Attach the exchange rate captured at creation time.
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.fx_rate = Some(rate);
        self
    }

    /// Mark this record as the replacement of an earlier version.
    pub fn with_replaces(mut self, old: Uuid) -> Self {
        self.replaces = Some(old);
        self
    }

    /// Attach a category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn paid_by(&self) -> &BTreeMap<MemberId, Money> {
        &self.paid_by
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn fx_rate(&self) -> Option<Decimal> {
        self.fx_rate
    }

    pub fn split(&self) -> &SplitStrategy {
        &self.split
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn replaces(&self) -> Option<Uuid> {
        self.replaces
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// A recorded real-world payment between two members.
///
/// Folds into the balance matrix exactly like an expense paid by `from`
/// and owed entirely by `to`: handing money over moves the payer's net
/// position up and the receiver's down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    id: Uuid,
    group: GroupId,
    /// The member who handed the money over.
    from: MemberId,
    /// The member who received it.
    to: MemberId,
    /// The amount paid, in `currency`. Must be positive.
    amount: Money,
    currency: CurrencyCode,
    /// Exchange rate into the group's base currency, captured at creation.
    fx_rate: Option<Decimal>,
    created_at: DateTime<Utc>,
    replaces: Option<Uuid>,
}

impl SettlementRecord {
    /// Create a new settlement record.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive or `from == to`.
    pub fn new(
        group: GroupId,
        from: MemberId,
        to: MemberId,
        amount: Money,
        currency: CurrencyCode,
    ) -> Self {
        assert!(
            amount.is_positive(),
            "Settlement amount must be positive, got {}",
            amount
        );
        assert!(from != to, "Settlement must involve two distinct members");
        Self {
            id: Uuid::new_v4(),
            group,
            from,
            to,
            amount,
            currency,
            fx_rate: None,
            created_at: Utc::now(),
            replaces: None,
        }
    }

    /// Create a settlement with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        group: GroupId,
        from: MemberId,
        to: MemberId,
        amount: Money,
        currency: CurrencyCode,
    ) -> Self {
        assert!(amount.is_positive());
        assert!(from != to);
        Self {
            id,
            group,
            from,
            to,
            amount,
            currency,
            fx_rate: None,
            created_at: Utc::now(),
            replaces: None,
        }
    }

    /// Attach the exchange rate captured at creation time.
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.fx_rate = Some(rate);
        self
    }

    /// Mark this record as the replacement of an earlier version.
    pub fn with_replaces(mut self, old: Uuid) -> Self {
        self.replaces = Some(old);
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn from(&self) -> &MemberId {
        &self.from
    }

    pub fn to(&self) -> &MemberId {
        &self.to
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn fx_rate(&self) -> Option<Decimal> {
        self.fx_rate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn replaces(&self) -> Option<Uuid> {
        self.replaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id)
    }

    fn sample_expense() -> ExpenseRecord {
        ExpenseRecord::new(
            GroupId::new("trip"),
            [(member("alice"), Money::from_minor(9000))].into(),
            Money::from_minor(9000),
            CurrencyCode::new("USD"),
            SplitStrategy::Equal {
                among: vec![member("alice"), member("bob"), member("carol")],
            },
        )
    }

    #[test]
    fn test_expense_creation() {
        let e = sample_expense();
        assert_eq!(e.total(), Money::from_minor(9000));
        assert_eq!(e.currency().as_str(), "USD");
        assert_eq!(e.paid_by().len(), 1);
        assert!(e.replaces().is_none());
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_expense_zero_total() {
        ExpenseRecord::new(
            GroupId::new("trip"),
            [(member("alice"), Money::ZERO)].into(),
            Money::ZERO,
            CurrencyCode::new("USD"),
            SplitStrategy::Equal {
                among: vec![member("alice")],
            },
        );
    }

    #[test]
    #[should_panic(expected = "at least one payer")]
    fn test_expense_no_payers() {
        ExpenseRecord::new(
            GroupId::new("trip"),
            BTreeMap::new(),
            Money::from_minor(100),
            CurrencyCode::new("USD"),
            SplitStrategy::Equal {
                among: vec![member("alice")],
            },
        );
    }

    #[test]
    #[should_panic(expected = "distinct members")]
    fn test_settlement_same_member() {
        SettlementRecord::new(
            GroupId::new("trip"),
            member("alice"),
            member("alice"),
            Money::from_minor(100),
            CurrencyCode::new("USD"),
        );
    }

    #[test]
    fn test_strategy_serializes_tagged() {
        let strategy = SplitStrategy::Equal {
            among: vec![member("alice"), member("bob")],
        };
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["type"], "equal");
        assert_eq!(json["among"][0], "alice");
    }

    #[test]
    fn test_expense_json_round_trip() {
        let e = sample_expense().with_category("food");
        let json = serde_json::to_string(&e).unwrap();
        let back: ExpenseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), e.id());
        assert_eq!(back.total(), e.total());
        assert_eq!(back.split(), e.split());
        assert_eq!(back.category(), Some("food"));
    }
}
