//! Vector index implementations.
//!
//! Only an exact (brute force) inner-product index is provided: the candidate
//! pool it searches is bounded by lexical pruning, so approximate structures
//! would buy nothing at query time.

pub mod flat;
