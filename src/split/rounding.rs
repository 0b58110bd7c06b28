use crate::core::member::MemberId;
use crate::core::money::Money;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Distribute `total` minor units across members proportionally to their
/// weights, without losing or inventing a single unit.
///
/// Each member first receives the floor of their proportional share; the
/// leftover units are then handed out one at a time by descending
/// fractional remainder, ties broken by ascending member id. The result
/// always sums to exactly `total`, and the same inputs always produce the
/// same assignment — there is no dependence on map iteration order or
/// evaluation order.
///
/// Callers guarantee a non-negative `total`, a non-empty weight map with
/// no negative weights, and a positive weight sum.
pub fn distribute(total: Money, weights: &BTreeMap<MemberId, Decimal>) -> BTreeMap<MemberId, Money> {
    debug_assert!(!total.is_negative());
    debug_assert!(!weights.is_empty());

    let weight_sum: Decimal = weights.values().copied().sum();
    debug_assert!(weight_sum > Decimal::ZERO);

    let total_dec = Decimal::from(total.minor());
    let mut shares: BTreeMap<MemberId, i64> = BTreeMap::new();
    let mut remainders: Vec<(Decimal, &MemberId)> = Vec::with_capacity(weights.len());

    for (member, weight) in weights {
        // Normalizing the weight first keeps the product bounded by the total.
        let ideal = total_dec * (weight / weight_sum);
        let floor = ideal.floor();
        shares.insert(member.clone(), floor.to_i64().unwrap_or(0));
        remainders.push((ideal - floor, member));
    }

    let assigned: i64 = shares.values().sum();
    let mut leftover = total.minor() - assigned;
    debug_assert!(leftover >= 0 && leftover <= weights.len() as i64);

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    for (_, member) in remainders {
        if leftover == 0 {
            break;
        }
        if let Some(share) = shares.get_mut(member) {
            *share += 1;
            leftover -= 1;
        }
    }

    shares
        .into_iter()
        .map(|(member, minor)| (member, Money::from_minor(minor)))
        .collect()
}

/// Even weights for a set of members, for equal splits.
pub fn even_weights<'a, I: IntoIterator<Item = &'a MemberId>>(
    members: I,
) -> BTreeMap<MemberId, Decimal> {
    members
        .into_iter()
        .map(|m| (m.clone(), Decimal::ONE))
        .collect()
}
