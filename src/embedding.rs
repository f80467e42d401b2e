//! Embedding sources for the dense half of hybrid retrieval.
//!
//! An [`Embedder`] turns a batch of strings into fixed-length vectors. The
//! retriever calls it once per passage batch while building, and once per
//! query. Two sources ship with the crate:
//!
//! - [`HashedEmbedder`]: deterministic feature hashing over word tokens,
//!   usable without any model files.
//! - [`PrecomputedEmbedder`]: exact-text lookup of vectors computed elsewhere.
//!
//! Model-backed embedders implement the same trait outside this crate.

pub mod embedder;
pub mod hashed;
pub mod precomputed;

pub use self::embedder::Embedder;
pub use self::hashed::HashedEmbedder;
pub use self::precomputed::PrecomputedEmbedder;
