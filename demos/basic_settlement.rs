//! Basic balance folding and settlement example.
//!
//! Demonstrates how a weekend trip's expenses fold into net balances and
//! how the greedy simplifier reduces them to a short transfer list.

use rust_decimal_macros::dec;
use splitledger::prelude::*;

fn main() {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  splitledger: Basic Settlement Example    ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let group = GroupId::new("ski-trip");
    let alice = MemberId::new("alice");
    let bob = MemberId::new("bob");
    let carol = MemberId::new("carol");
    let dave = MemberId::new("dave");

    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    for member in [&alice, &bob, &carol, &dave] {
        ledger.add_member(member.clone());
    }

    // --- Scenario 1: one dinner, split evenly ---
    println!("━━━ Scenario 1: One dinner, split evenly ━━━\n");

    ledger.record_expense(
        ExpenseRecord::new(
            group.clone(),
            [(alice.clone(), Money::from_minor(9000))].into(),
            Money::from_minor(9000),
            CurrencyCode::new("USD"),
            SplitStrategy::Equal {
                among: vec![alice.clone(), bob.clone(), carol.clone()],
            },
        )
        .with_category("food"),
    );

    let service = LedgerService::new();
    let report = service.report(&store, &group).expect("fold should succeed");
    print_report(&report);

    // --- Scenario 2: a full weekend ---
    println!("━━━ Scenario 2: A full weekend of expenses ━━━\n");

    let ledger = store.group_mut(&group).expect("group exists");

    // Cabin, paid by bob, weighted by nights stayed.
    ledger.record_expense(
        ExpenseRecord::new(
            group.clone(),
            [(bob.clone(), Money::from_minor(48_000))].into(),
            Money::from_minor(48_000),
            CurrencyCode::new("USD"),
            SplitStrategy::Shares {
                weights: [
                    (alice.clone(), 2),
                    (bob.clone(), 2),
                    (carol.clone(), 1),
                    (dave.clone(), 3),
                ]
                .into(),
            },
        )
        .with_category("lodging"),
    );

    // Lift tickets bought abroad in EUR, rate captured at purchase time.
    ledger.record_expense(
        ExpenseRecord::new(
            group.clone(),
            [(carol.clone(), Money::from_minor(20_000))].into(),
            Money::from_minor(20_000),
            CurrencyCode::new("EUR"),
            SplitStrategy::Equal {
                among: vec![alice.clone(), bob.clone(), carol.clone(), dave.clone()],
            },
        )
        .with_rate(dec!(1.08)),
    );

    // Groceries, exact amounts agreed at checkout.
    ledger.record_expense(ExpenseRecord::new(
        group.clone(),
        [(dave.clone(), Money::from_minor(6400))].into(),
        Money::from_minor(6400),
        CurrencyCode::new("USD"),
        SplitStrategy::Exact {
            amounts: [
                (alice.clone(), Money::from_minor(1600)),
                (bob.clone(), Money::from_minor(2400)),
                (dave.clone(), Money::from_minor(2400)),
            ]
            .into(),
        },
    ));

    // Bob already paid alice back for the dinner.
    ledger.record_settlement(SettlementRecord::new(
        group.clone(),
        bob.clone(),
        alice.clone(),
        Money::from_minor(3000),
        CurrencyCode::new("USD"),
    ));

    let report = service.report(&store, &group).expect("fold should succeed");
    print_report(&report);

    println!(
        "Pairwise balances simplified: {} → {} transfers ({:.0}% fewer)",
        report.balances.len(),
        report.plan.len(),
        report.plan.reduction_percent(report.balances.len())
    );
}

fn print_report(report: &GroupReport) {
    println!("Net positions:");
    for (member, position) in &report.positions {
        let status = if position.is_positive() {
            "CREDITOR"
        } else if position.is_negative() {
            "DEBTOR"
        } else {
            "FLAT"
        };
        println!("  {:<8} {:>8}  [{}]", member.to_string(), position.to_string(), status);
    }
    println!();
    println!("{}", report.plan);
}
