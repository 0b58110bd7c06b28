use crate::core::member::MemberId;
use crate::core::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A nonzero net balance between two members.
///
/// `amount` is always positive: `debtor` owes `creditor` that much after
/// folding the whole surviving history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub creditor: MemberId,
    pub debtor: MemberId,
    pub amount: Money,
}

/// Pairwise net balances for one group.
///
/// Tracks `net(creditor, debtor)` for every ordered member pair, with
/// antisymmetry maintained by construction: every debt write updates both
/// directions, so `net(a, b) == -net(b, a)` always holds and the sum of
/// all scalar positions is exactly zero.
///
/// A positive scalar position means the member is owed money overall; a
/// negative one means they owe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceMatrix {
    /// (creditor, debtor) -> net amount the debtor owes the creditor.
    #[serde(with = "net_serde")]
    net: BTreeMap<(MemberId, MemberId), Money>,
}

mod net_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        net: &BTreeMap<(MemberId, MemberId), Money>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(net.len()))?;
        for ((creditor, debtor), amount) in net {
            map.serialize_entry(&format!("{}:{}", creditor, debtor), amount)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(MemberId, MemberId), Money>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = BTreeMap<(MemberId, MemberId), Money>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"creditor:debtor\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Money>()? {
                    let (creditor, debtor) = key
                        .split_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    map.insert((MemberId::new(creditor), MemberId::new(debtor)), value);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl BalanceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `debtor` owes `creditor` an additional `amount`.
    pub fn add_debt(&mut self, creditor: &MemberId, debtor: &MemberId, amount: Money) {
        if creditor == debtor || amount.is_zero() {
            return;
        }
        *self
            .net
            .entry((creditor.clone(), debtor.clone()))
            .or_default() += amount;
        *self
            .net
            .entry((debtor.clone(), creditor.clone()))
            .or_default() -= amount;
    }

    /// Net amount `b` owes `a`. Negative means `a` owes `b`.
    pub fn net_between(&self, a: &MemberId, b: &MemberId) -> Money {
        self.net
            .get(&(a.clone(), b.clone()))
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Scalar net position of one member: positive = net creditor.
    pub fn position(&self, member: &MemberId) -> Money {
        self.net
            .iter()
            .filter(|((a, _), _)| a == member)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Scalar net positions of every member seen in the matrix.
    pub fn positions(&self) -> BTreeMap<MemberId, Money> {
        let mut positions: BTreeMap<MemberId, Money> = BTreeMap::new();
        for ((a, _), amount) in &self.net {
            *positions.entry(a.clone()).or_default() += *amount;
        }
        positions
    }

    /// All members appearing in the matrix.
    pub fn members(&self) -> BTreeSet<MemberId> {
        self.net.keys().map(|(a, _)| a.clone()).collect()
    }

    /// All pairs with a nonzero net amount, one entry per unordered pair,
    /// in deterministic (creditor, debtor) order.
    pub fn pair_balances(&self) -> Vec<Balance> {
        self.net
            .iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|((creditor, debtor), amount)| Balance {
                creditor: creditor.clone(),
                debtor: debtor.clone(),
                amount: *amount,
            })
            .collect()
    }

    /// Whether scalar positions sum to exactly zero. True for any matrix
    /// built through `add_debt`; false only for hand-assembled input.
    pub fn is_balanced(&self) -> bool {
        let sum: Money = self.positions().values().sum();
        sum.is_zero()
    }

    /// Total amount owed across all debtor positions — what actually needs
    /// to move for the group to settle.
    pub fn total_outstanding(&self) -> Money {
        self.positions()
            .values()
            .filter(|p| p.is_positive())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str) -> MemberId {
        MemberId::new(id)
    }

    #[test]
    fn test_debt_is_antisymmetric() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("alice"), &member("bob"), Money::from_minor(3000));

        assert_eq!(
            matrix.net_between(&member("alice"), &member("bob")),
            Money::from_minor(3000)
        );
        assert_eq!(
            matrix.net_between(&member("bob"), &member("alice")),
            Money::from_minor(-3000)
        );
    }

    #[test]
    fn test_opposing_debts_cancel() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("alice"), &member("bob"), Money::from_minor(100));
        matrix.add_debt(&member("bob"), &member("alice"), Money::from_minor(60));

        assert_eq!(
            matrix.net_between(&member("alice"), &member("bob")),
            Money::from_minor(40)
        );
        assert_eq!(matrix.pair_balances().len(), 1);
    }

    #[test]
    fn test_positions_sum_to_zero() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("alice"), &member("bob"), Money::from_minor(100));
        matrix.add_debt(&member("bob"), &member("carol"), Money::from_minor(250));
        matrix.add_debt(&member("carol"), &member("alice"), Money::from_minor(30));

        let sum: Money = matrix.positions().values().sum();
        assert_eq!(sum, Money::ZERO);
        assert!(matrix.is_balanced());
    }

    #[test]
    fn test_self_debt_is_ignored() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("alice"), &member("alice"), Money::from_minor(100));
        assert!(matrix.pair_balances().is_empty());
    }

    #[test]
    fn test_circular_debt_zeroes_positions() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("a"), &member("b"), Money::from_minor(100));
        matrix.add_debt(&member("b"), &member("c"), Money::from_minor(100));
        matrix.add_debt(&member("c"), &member("a"), Money::from_minor(100));

        for m in ["a", "b", "c"] {
            assert_eq!(matrix.position(&member(m)), Money::ZERO);
        }
        assert_eq!(matrix.total_outstanding(), Money::ZERO);
        // Pairwise balances remain even though scalar positions are flat.
        assert_eq!(matrix.pair_balances().len(), 3);
    }

    #[test]
    fn test_pair_balances_order_is_deterministic() {
        let mut matrix = BalanceMatrix::new();
        matrix.add_debt(&member("carol"), &member("bob"), Money::from_minor(10));
        matrix.add_debt(&member("alice"), &member("dave"), Money::from_minor(20));

        let pairs = matrix.pair_balances();
        assert_eq!(pairs[0].creditor, member("alice"));
        assert_eq!(pairs[1].creditor, member("carol"));
    }
}
