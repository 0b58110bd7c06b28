//! Simplification of net balances into a minimal transfer plan.

pub mod plan;
pub mod simplifier;
