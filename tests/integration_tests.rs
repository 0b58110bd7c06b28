use rust_decimal_macros::dec;
use splitledger::core::currency::CurrencyCode;
use splitledger::core::ledger::{LedgerStore, SnapshotSource};
use splitledger::core::member::{GroupId, MemberId};
use splitledger::core::money::Money;
use splitledger::core::record::{ExpenseRecord, SettlementRecord, SplitStrategy};
use splitledger::service::engine::LedgerService;
use splitledger::service::error::EngineError;
use splitledger::settlement::plan::Transaction;

fn member(id: &str) -> MemberId {
    MemberId::new(id)
}

fn equal_expense(group: &GroupId, payer: &str, total: i64, among: &[&str]) -> ExpenseRecord {
    ExpenseRecord::new(
        group.clone(),
        [(member(payer), Money::from_minor(total))].into(),
        Money::from_minor(total),
        CurrencyCode::new("USD"),
        SplitStrategy::Equal {
            among: among.iter().map(|m| member(m)).collect(),
        },
    )
}

/// Full pipeline test: records → snapshot → splits → fold → balances → plan.
#[test]
fn full_pipeline_weekend_trip() {
    let group = GroupId::new("ski-trip");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    for m in ["alice", "bob", "carol", "dave", "erin"] {
        ledger.add_member(member(m));
    }

    // Dinner: alice pays, three people ate.
    ledger.record_expense(equal_expense(&group, "alice", 9000, &["alice", "bob", "carol"]));

    // Cabin: bob pays, split by nights stayed.
    ledger.record_expense(ExpenseRecord::new(
        group.clone(),
        [(member("bob"), Money::from_minor(48_000))].into(),
        Money::from_minor(48_000),
        CurrencyCode::new("USD"),
        SplitStrategy::Shares {
            weights: [
                (member("alice"), 2),
                (member("bob"), 2),
                (member("carol"), 1),
                (member("dave"), 3),
            ]
            .into(),
        },
    ));

    // Lift tickets: carol pays in EUR, rate captured at purchase.
    ledger.record_expense(
        ExpenseRecord::new(
            group.clone(),
            [(member("carol"), Money::from_minor(20_000))].into(),
            Money::from_minor(20_000),
            CurrencyCode::new("EUR"),
            SplitStrategy::Equal {
                among: vec![
                    member("alice"),
                    member("bob"),
                    member("carol"),
                    member("dave"),
                    member("erin"),
                ],
            },
        )
        .with_rate(dec!(1.08)),
    );

    // Bob paid alice back for his share of the dinner.
    ledger.record_settlement(SettlementRecord::new(
        group.clone(),
        member("bob"),
        member("alice"),
        Money::from_minor(3000),
        CurrencyCode::new("USD"),
    ));

    let service = LedgerService::new();
    let report = service.report(&store, &group).unwrap();

    // Positions: dinner + cabin + 21600 base of lift tickets + settlement.
    assert_eq!(report.positions[&member("alice")], Money::from_minor(-13_320));
    assert_eq!(report.positions[&member("bob")], Money::from_minor(31_680));
    assert_eq!(report.positions[&member("carol")], Money::from_minor(8_280));
    assert_eq!(report.positions[&member("dave")], Money::from_minor(-22_320));
    assert_eq!(report.positions[&member("erin")], Money::from_minor(-4_320));

    let sum: Money = report.positions.values().sum();
    assert_eq!(sum, Money::ZERO);

    // Five members with nonzero positions settle in at most four transfers.
    assert_eq!(
        report.plan.transactions(),
        &[
            Transaction {
                from: member("dave"),
                to: member("bob"),
                amount: Money::from_minor(22_320),
            },
            Transaction {
                from: member("alice"),
                to: member("bob"),
                amount: Money::from_minor(9_360),
            },
            Transaction {
                from: member("erin"),
                to: member("carol"),
                amount: Money::from_minor(4_320),
            },
            Transaction {
                from: member("alice"),
                to: member("carol"),
                amount: Money::from_minor(3_960),
            },
        ]
    );

    // Applying the plan settles everyone.
    let mut positions = report.positions.clone();
    report.plan.apply(&mut positions);
    assert!(positions.values().all(|p| p.is_zero()));

    // Recomputing the same snapshot reproduces the report exactly.
    let again = LedgerService::compute(&store.snapshot(&group).unwrap()).unwrap();
    assert_eq!(again.positions, report.positions);
    assert_eq!(again.balances, report.balances);
    assert_eq!(again.plan, report.plan);
}

/// Editing a historical expense must be indistinguishable from a history
/// that only ever contained the corrected version.
#[test]
fn edit_replay_matches_fresh_history() {
    let group = GroupId::new("flat");

    let mut edited = LedgerStore::new();
    let ledger = edited.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.add_member(member("alice"));
    ledger.add_member(member("bob"));
    ledger.record_expense(equal_expense(&group, "alice", 10_000, &["alice", "bob"]));
    let wrong = ledger.record_expense(equal_expense(&group, "bob", 9_000, &["alice", "bob"]));
    ledger
        .amend_expense(wrong, equal_expense(&group, "bob", 12_000, &["alice", "bob"]))
        .unwrap();

    let mut fresh = LedgerStore::new();
    let ledger = fresh.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.add_member(member("alice"));
    ledger.add_member(member("bob"));
    ledger.record_expense(equal_expense(&group, "alice", 10_000, &["alice", "bob"]));
    ledger.record_expense(equal_expense(&group, "bob", 12_000, &["alice", "bob"]));

    let edited_report = LedgerService::compute(&edited.snapshot(&group).unwrap()).unwrap();
    let fresh_report = LedgerService::compute(&fresh.snapshot(&group).unwrap()).unwrap();

    assert_eq!(edited_report.positions, fresh_report.positions);
    assert_eq!(edited_report.balances, fresh_report.balances);
    assert_eq!(edited_report.plan, fresh_report.plan);
}

/// A retracted expense contributes nothing to balances.
#[test]
fn retraction_removes_contribution() {
    let group = GroupId::new("flat");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.add_member(member("alice"));
    ledger.add_member(member("bob"));
    ledger.record_expense(equal_expense(&group, "alice", 10_000, &["alice", "bob"]));
    let disputed = ledger.record_expense(equal_expense(&group, "alice", 50_000, &["alice", "bob"]));
    ledger.retract(disputed).unwrap();

    let report = LedgerService::compute(&store.snapshot(&group).unwrap()).unwrap();
    assert_eq!(report.positions[&member("bob")], Money::from_minor(-5_000));
}

/// The deterministic remainder policy: the indivisible cent lands on the
/// lowest member id.
#[test]
fn remainder_lands_on_lowest_member_id() {
    let group = GroupId::new("lunch");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.record_expense(equal_expense(&group, "carol", 10_000, &["alice", "bob", "carol"]));

    let report = LedgerService::compute(&store.snapshot(&group).unwrap()).unwrap();

    // alice 3334, bob 3333 owed to carol; carol keeps her own 3333.
    assert_eq!(report.positions[&member("alice")], Money::from_minor(-3_334));
    assert_eq!(report.positions[&member("bob")], Money::from_minor(-3_333));
    assert_eq!(report.positions[&member("carol")], Money::from_minor(6_667));
}

/// An empty group produces an empty but valid report.
#[test]
fn empty_group_is_settled() {
    let group = GroupId::new("new-group");
    let mut store = LedgerStore::new();
    store.create_group(group.clone(), CurrencyCode::new("USD"));

    let service = LedgerService::new();
    let report = service.report(&store, &group).unwrap();
    assert!(report.balances.is_empty());
    assert!(report.plan.is_empty());

    let json = serde_json::to_string(&*report).unwrap();
    assert!(!json.is_empty());
}

/// The stale-snapshot retry loop a caller is expected to drive.
#[test]
fn stale_snapshot_retries_with_fresh_head() {
    let group = GroupId::new("flat");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.record_expense(equal_expense(&group, "alice", 1_000, &["alice", "bob"]));
    let stale_head = store.head(&group).unwrap();

    // A write lands before the query runs.
    store
        .group_mut(&group)
        .unwrap()
        .record_expense(equal_expense(&group, "bob", 2_000, &["alice", "bob"]));

    let service = LedgerService::new();
    let latest = match service.report_at(&store, &group, stale_head) {
        Err(EngineError::StaleSnapshot { latest, .. }) => latest,
        other => panic!("expected StaleSnapshot, got {:?}", other.map(|r| r.sequence)),
    };
    let report = service.report_at(&store, &group, latest).unwrap();
    assert_eq!(report.sequence, latest);
}

/// The plan is meaningfully shorter than paying off raw pairwise balances.
#[test]
fn plan_compresses_pairwise_balances() {
    let group = GroupId::new("dinner-club");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    // Four rotating dinners leave every pair with some nonzero balance.
    ledger.record_expense(equal_expense(&group, "alice", 8_100, &["alice", "bob", "carol"]));
    ledger.record_expense(equal_expense(&group, "bob", 6_300, &["bob", "carol", "dave"]));
    ledger.record_expense(equal_expense(&group, "carol", 9_900, &["alice", "carol", "dave"]));
    ledger.record_expense(equal_expense(&group, "dave", 7_200, &["alice", "bob", "dave"]));

    let report = LedgerService::compute(&store.snapshot(&group).unwrap()).unwrap();

    // Six nonzero pairs collapse into three transfers.
    assert_eq!(report.balances.len(), 6);
    assert_eq!(report.plan.len(), 3);
    approx::assert_relative_eq!(report.plan.reduction_percent(report.balances.len()), 50.0);
}

/// Reports serialize to JSON with the fields consumers rely on.
#[test]
fn report_serializes() {
    let group = GroupId::new("trip");
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new("USD"));
    ledger.record_expense(equal_expense(&group, "alice", 9_000, &["alice", "bob", "carol"]));

    let report = LedgerService::compute(&store.snapshot(&group).unwrap()).unwrap();
    let json = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(parsed.get("positions").is_some());
    assert!(parsed.get("balances").is_some());
    assert!(parsed.get("plan").is_some());
    assert_eq!(parsed["group"], "trip");
}
