//! Exact dense-vector search.
//!
//! This module provides vector (semantic) search over unit-normalized
//! embeddings. Because every stored and query vector has unit L2 norm, the
//! inner product used for ranking equals cosine similarity.
//!
//! # Module Structure
//!
//! - `core`: the [`Vector`] data structure
//! - `index`: the exact inner-product [`FlatIndex`] with full and subset search

pub mod core;
pub mod index;

pub use self::core::vector::Vector;
pub use self::index::flat::{FlatIndex, VectorHit};
