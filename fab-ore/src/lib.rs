//! Odds and ends shared across the `fab` crates.

pub mod assert;
pub mod env;
pub mod id_gen;
