//! Lexical (keyword-based) scoring.
//!
//! This module provides the BM25 index built once over a passage store and
//! the two lexical scoring strategies that feed hybrid fusion:
//!
//! - **Joint**: one BM25 score over the whole query token list
//! - **Weighted**: a weighted sum of single-token BM25 scores

pub mod bm25;
pub mod scoring;

pub use self::bm25::{Bm25Index, Bm25Params};
pub use self::scoring::LexicalScoring;
