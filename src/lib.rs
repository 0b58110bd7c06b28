//! # splitledger
//!
//! Shared-expense ledger folding and settlement simplification engine.
//!
//! Given a group's history of expenses and recorded payments, this engine
//! answers two questions: what each member owes or is owed relative to
//! every other member, and the smallest set of transfers that would bring
//! every member's net balance to zero.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: members, integer money, currencies, records, the group ledger
//! - **split** — Expansion of one record into exact per-member shares
//! - **balance** — The pairwise net balance matrix and the fold over history
//! - **settlement** — Greedy simplification of balances into a minimal transfer plan
//! - **service** — Query surface, derived cache, per-group single-flight recompute
//! - **simulation** — Random history generation for stress testing

pub mod balance;
pub mod core;
pub mod service;
pub mod settlement;
pub mod simulation;
pub mod split;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::balance::accumulator::BalanceAccumulator;
    pub use crate::balance::matrix::{Balance, BalanceMatrix};
    pub use crate::core::currency::CurrencyCode;
    pub use crate::core::ledger::{GroupLedger, LedgerSnapshot, LedgerStore, SnapshotSource};
    pub use crate::core::member::{GroupId, MemberId};
    pub use crate::core::money::Money;
    pub use crate::core::record::{ExpenseRecord, SettlementRecord, SplitStrategy};
    pub use crate::service::engine::{GroupReport, LedgerService};
    pub use crate::service::error::EngineError;
    pub use crate::settlement::plan::{SettlementPlan, Transaction};
    pub use crate::settlement::simplifier::SettlementSimplifier;
    pub use crate::split::resolver::{Split, SplitResolver};
}
