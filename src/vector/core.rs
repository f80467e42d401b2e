//! Core data structures for vector search.

pub mod vector;
