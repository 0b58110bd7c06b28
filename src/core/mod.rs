//! Foundational types: members, integer money, currencies, ledger records
//! and the append-only group ledger.

pub mod currency;
pub mod ledger;
pub mod member;
pub mod money;
pub mod record;
