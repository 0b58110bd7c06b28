//! Query surface over the ledger: cached balance reports, settlement
//! plans, and the per-group single-flight recompute gate.

pub mod engine;
pub mod error;
pub mod singleflight;
