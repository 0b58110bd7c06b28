//! Retroactive edit example.
//!
//! Shows that editing a historical expense — supersede the old version,
//! append the corrected one — produces exactly the balances a history
//! with only the corrected version would have produced.

use splitledger::prelude::*;

fn main() {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  splitledger: Retroactive Edit Example    ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let group = GroupId::new("flatmates");
    let alice = MemberId::new("alice");
    let bob = MemberId::new("bob");

    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.add_member(alice.clone());
    ledger.add_member(bob.clone());

    // Rent, split evenly.
    ledger.record_expense(ExpenseRecord::new(
        group.clone(),
        [(alice.clone(), Money::from_minor(120_000))].into(),
        Money::from_minor(120_000),
        CurrencyCode::new("USD"),
        SplitStrategy::Equal {
            among: vec![alice.clone(), bob.clone()],
        },
    ));

    // Utilities — recorded with the wrong amount.
    let utilities = ledger.record_expense(ExpenseRecord::new(
        group.clone(),
        [(bob.clone(), Money::from_minor(9000))].into(),
        Money::from_minor(9000),
        CurrencyCode::new("USD"),
        SplitStrategy::Equal {
            among: vec![alice.clone(), bob.clone()],
        },
    ));

    let service = LedgerService::new();
    let before = service.report(&store, &group).expect("fold should succeed");
    println!("Before the correction (sequence {}):", before.sequence);
    println!("{}", before.plan);

    // The bill was actually 12000. Supersede and recompute.
    let ledger = store.group_mut(&group).expect("group exists");
    ledger
        .amend_expense(
            utilities,
            ExpenseRecord::new(
                group.clone(),
                [(bob.clone(), Money::from_minor(12_000))].into(),
                Money::from_minor(12_000),
                CurrencyCode::new("USD"),
                SplitStrategy::Equal {
                    among: vec![alice.clone(), bob.clone()],
                },
            ),
        )
        .expect("record is live");

    let after = service.report(&store, &group).expect("fold should succeed");
    println!("After the correction (sequence {}):", after.sequence);
    println!("{}", after.plan);

    // A fresh ledger that only ever saw the corrected amount agrees.
    let mut fresh_store = LedgerStore::new();
    let fresh = fresh_store.create_group(group.clone(), CurrencyCode::new("USD"));
    fresh.add_member(alice.clone());
    fresh.add_member(bob.clone());
    fresh.record_expense(ExpenseRecord::new(
        group.clone(),
        [(alice.clone(), Money::from_minor(120_000))].into(),
        Money::from_minor(120_000),
        CurrencyCode::new("USD"),
        SplitStrategy::Equal {
            among: vec![alice.clone(), bob.clone()],
        },
    ));
    fresh.record_expense(ExpenseRecord::new(
        group.clone(),
        [(bob.clone(), Money::from_minor(12_000))].into(),
        Money::from_minor(12_000),
        CurrencyCode::new("USD"),
        SplitStrategy::Equal {
            among: vec![alice.clone(), bob.clone()],
        },
    ));

    let fresh_service = LedgerService::new();
    let fresh_report = fresh_service
        .report(&fresh_store, &group)
        .expect("fold should succeed");
    println!(
        "Edited history and fresh history agree: {}",
        after.positions == fresh_report.positions && after.plan == fresh_report.plan
    );
}
