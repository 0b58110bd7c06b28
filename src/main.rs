//! splitledger CLI
//!
//! Compute balances and settlement plans for a group history from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Who owes whom, from a JSON group file
//! splitledger balances --input group.json
//!
//! # The minimal transfer plan that settles the group
//! splitledger plan --input group.json --format json
//!
//! # Generate a random group history for testing
//! splitledger generate --members 8 --expenses 30
//! ```

use rust_decimal::Decimal;
use splitledger::balance::matrix::Balance;
use splitledger::core::currency::CurrencyCode;
use splitledger::core::ledger::LedgerStore;
use splitledger::core::member::{GroupId, MemberId};
use splitledger::core::money::Money;
use splitledger::core::record::{ExpenseRecord, SettlementRecord, SplitStrategy};
use splitledger::service::engine::LedgerService;
use splitledger::simulation::random_history::{generate_random_history, HistoryConfig};
use std::collections::BTreeMap;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"splitledger — shared-expense ledger folding and settlement simplification

USAGE:
    splitledger <COMMAND> [OPTIONS]

COMMANDS:
    balances    Net balances between all members of a group
    plan        Minimal transfer plan that settles the group
    generate    Generate a random group history (for testing)
    help        Show this message

OPTIONS (balances, plan):
    --input <FILE>      Path to a JSON group file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --members <N>       Number of members (default: 6)
    --expenses <N>      Number of expenses (default: 20)
    --settlements <N>   Number of settlements (default: 3)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    splitledger balances --input group.json
    splitledger plan --input group.json --format json
    splitledger generate --members 8 --expenses 30 --output group.json"#
    );
}

/// JSON schema for input group files.
#[derive(serde::Deserialize)]
struct GroupFile {
    group: String,
    base_currency: String,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    expenses: Vec<ExpenseInput>,
    #[serde(default)]
    settlements: Vec<SettlementInput>,
}

#[derive(serde::Deserialize)]
struct ExpenseInput {
    /// Payer -> amount paid, in minor units of `currency`.
    paid_by: BTreeMap<String, i64>,
    /// Full expense amount in minor units of `currency`.
    total: i64,
    #[serde(default = "default_currency")]
    currency: String,
    /// Rate into the base currency, captured when the expense was recorded.
    #[serde(default)]
    rate: Option<Decimal>,
    split: SplitStrategy,
    #[serde(default)]
    category: Option<String>,
}

#[derive(serde::Deserialize)]
struct SettlementInput {
    from: String,
    to: String,
    amount: i64,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default)]
    rate: Option<Decimal>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn load_group(path: &str) -> (LedgerStore, GroupId) {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    let file: GroupFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "group": "trip",
  "base_currency": "USD",
  "members": ["alice", "bob", "carol"],
  "expenses": [
    {{
      "paid_by": {{ "alice": 9000 }},
      "total": 9000,
      "currency": "USD",
      "split": {{ "type": "equal", "among": ["alice", "bob", "carol"] }}
    }}
  ],
  "settlements": [
    {{ "from": "bob", "to": "alice", "amount": 3000 }}
  ]
}}"#
        );
        process::exit(1);
    });

    let group = GroupId::new(&file.group);
    let mut store = LedgerStore::new();
    let ledger = store.create_group(group.clone(), CurrencyCode::new(&file.base_currency));

    for member in &file.members {
        ledger.add_member(MemberId::new(member));
    }

    for expense in file.expenses {
        let paid_by: BTreeMap<MemberId, Money> = expense
            .paid_by
            .into_iter()
            .map(|(m, amount)| (MemberId::new(m), Money::from_minor(amount)))
            .collect();
        let mut record = ExpenseRecord::new(
            group.clone(),
            paid_by,
            Money::from_minor(expense.total),
            CurrencyCode::new(&expense.currency),
            expense.split,
        );
        if let Some(rate) = expense.rate {
            record = record.with_rate(rate);
        }
        if let Some(category) = expense.category {
            record = record.with_category(category);
        }
        ledger.record_expense(record);
    }

    for settlement in file.settlements {
        let mut record = SettlementRecord::new(
            group.clone(),
            MemberId::new(&settlement.from),
            MemberId::new(&settlement.to),
            Money::from_minor(settlement.amount),
            CurrencyCode::new(&settlement.currency),
        );
        if let Some(rate) = settlement.rate {
            record = record.with_rate(rate);
        }
        ledger.record_settlement(record);
    }

    (store, group)
}

struct QueryArgs {
    input: String,
    format: String,
}

fn parse_query_args(args: &[String]) -> QueryArgs {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    QueryArgs { input, format }
}

fn cmd_balances(args: &[String]) {
    let query = parse_query_args(args);
    let (store, group) = load_group(&query.input);
    let service = LedgerService::new();

    let report = service.report(&store, &group).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if query.format == "json" {
        #[derive(serde::Serialize)]
        struct BalancesOutput<'a> {
            group: &'a GroupId,
            sequence: u64,
            positions: &'a BTreeMap<MemberId, Money>,
            balances: &'a [Balance],
        }
        let output = BalancesOutput {
            group: &report.group,
            sequence: report.sequence,
            positions: &report.positions,
            balances: &report.balances,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("=== Balances: {} (sequence {}) ===", report.group, report.sequence);
        for (member, position) in &report.positions {
            let status = if position.is_positive() {
                "is owed"
            } else if position.is_negative() {
                "owes"
            } else {
                "settled"
            };
            println!("  {:<16} {} {}", member.to_string(), status, position.abs());
        }
        println!("\nPairs:");
        if report.balances.is_empty() {
            println!("  (none)");
        }
        for balance in &report.balances {
            println!(
                "  {} owes {}: {}",
                balance.debtor, balance.creditor, balance.amount
            );
        }
    }
}

fn cmd_plan(args: &[String]) {
    let query = parse_query_args(args);
    let (store, group) = load_group(&query.input);
    let service = LedgerService::new();

    let report = service.report(&store, &group).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if query.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report.plan).unwrap());
    } else {
        println!("{}", report.plan);
        println!(
            "Pairwise balances simplified: {} → {} transfers",
            report.balances.len(),
            report.plan.len()
        );
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = HistoryConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--members" => {
                i += 1;
                config.member_count = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--members requires a number");
                    process::exit(1);
                });
            }
            "--expenses" => {
                i += 1;
                config.expense_count = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--expenses requires a number");
                    process::exit(1);
                });
            }
            "--settlements" => {
                i += 1;
                config.settlement_count =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--settlements requires a number");
                        process::exit(1);
                    });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let ledger = generate_random_history(&config);
    let snapshot = ledger.snapshot();

    #[derive(serde::Serialize)]
    struct OutputExpense<'a> {
        paid_by: BTreeMap<&'a MemberId, Money>,
        total: Money,
        currency: &'a CurrencyCode,
        #[serde(skip_serializing_if = "Option::is_none")]
        rate: Option<Decimal>,
        split: &'a SplitStrategy,
    }

    #[derive(serde::Serialize)]
    struct OutputSettlement<'a> {
        from: &'a MemberId,
        to: &'a MemberId,
        amount: Money,
        currency: &'a CurrencyCode,
    }

    #[derive(serde::Serialize)]
    struct OutputFile<'a> {
        group: &'a GroupId,
        base_currency: &'a CurrencyCode,
        members: &'a [MemberId],
        expenses: Vec<OutputExpense<'a>>,
        settlements: Vec<OutputSettlement<'a>>,
    }

    let output = OutputFile {
        group: &snapshot.group,
        base_currency: &snapshot.base_currency,
        members: &snapshot.members,
        expenses: snapshot
            .expenses
            .iter()
            .map(|e| OutputExpense {
                paid_by: e.paid_by().iter().map(|(m, a)| (m, *a)).collect(),
                total: e.total(),
                currency: e.currency(),
                rate: e.fx_rate(),
                split: e.split(),
            })
            .collect(),
        settlements: snapshot
            .settlements
            .iter()
            .map(|s| OutputSettlement {
                from: s.from(),
                to: s.to(),
                amount: s.amount(),
                currency: s.currency(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} records across {} members → {}",
            snapshot.record_count(),
            snapshot.members.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "balances" => cmd_balances(rest),
        "plan" => cmd_plan(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
