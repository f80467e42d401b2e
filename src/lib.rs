//! # Lorekeeper
//!
//! Hybrid passage retrieval for a fixed document collection, combining a
//! BM25 lexical signal with dense-vector similarity.
//!
//! ## Features
//!
//! - BM25 (Okapi) lexical index with postings and floored IDF
//! - Exact inner-product vector index with SIMD kernels
//! - Lexical candidate pruning before vector re-ranking
//! - Min-max normalized linear fusion with a per-call weight
//! - Category filtering and exact-text deduplication
//! - Copy-and-swap re-initialization behind one retriever handle
//! - Optional lemmatization shared by the index and queries
//! - Precision, recall and semantic similarity evaluation
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lorekeeper::prelude::*;
//!
//! let retriever = Retriever::new();
//! retriever
//!     .initialize(
//!         vec![
//!             Passage::new("r1", "Grappling uses a contested athletics check.", "combat"),
//!             Passage::new("r2", "Inns charge five silver per night.", "location"),
//!             Passage::new("r3", "The lich hides its phylactery.", "narrative"),
//!         ],
//!         Arc::new(HashedEmbedder::default()),
//!     )
//!     .unwrap();
//!
//! let request = SearchRequest::new("grappling check").top_k(2).alpha(1.0);
//! let results = retriever.search_with(&request).unwrap();
//! assert_eq!(results.ids()[0], "r1");
//! ```

pub mod analysis;
pub mod cli;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod hybrid;
pub mod lexical;
pub mod passage;
pub mod query;
pub mod retriever;
pub mod util;
pub mod vector;

pub mod prelude {
    pub use crate::analysis::keywords::KeywordWeights;
    pub use crate::analysis::lemma::{LemmaTable, LemmatizingTokenizer, PluralLemmatizer};
    pub use crate::analysis::tokenizer::Tokenizer;
    pub use crate::embedding::{Embedder, HashedEmbedder, PrecomputedEmbedder};
    pub use crate::error::{LorekeeperError, Result};
    pub use crate::eval::{EvalQuery, EvalReport, Evaluator};
    pub use crate::hybrid::selector::SelectionFilter;
    pub use crate::hybrid::types::{ScoredPassage, SearchRequest, SearchResults};
    pub use crate::lexical::scoring::LexicalScoring;
    pub use crate::passage::{Passage, PassageStore, SourceFilter};
    pub use crate::retriever::{BuildHandle, Retriever, RetrieverStatus};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
