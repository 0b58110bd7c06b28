//! The pairwise net balance matrix and the fold that builds it from
//! resolved history.

pub mod accumulator;
pub mod matrix;
