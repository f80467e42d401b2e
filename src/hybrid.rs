//! Hybrid retrieval combining BM25 and dense-vector scores.
//!
//! The pipeline runs in four stages over one index snapshot:
//!
//! - **Candidate generation** (`candidate`): keep the lexically strongest
//!   passages and re-rank only those by inner product.
//! - **Fusion** (`scorer`): min-max normalize both score vectors and blend
//!   them with a per-call `alpha`.
//! - **Selection** (`selector`): walk the fused ranking, apply the category
//!   filter, drop duplicate texts and stop at `top_k`.
//! - **Search** (`searcher`): runs the stages above for one request.
//!
//! # Example
//!
//! ```
//! use lorekeeper::hybrid::types::SearchRequest;
//!
//! let request = SearchRequest::new("how does grappling work")
//!     .top_k(3)
//!     .alpha(0.5)
//!     .section_type("combat");
//! assert!(request.validate().is_ok());
//! ```

pub mod candidate;
pub mod config;
pub mod scorer;
pub mod searcher;
pub mod selector;
pub mod types;

pub use self::candidate::{CandidateGenerator, CandidatePool};
pub use self::config::RetrieverConfig;
pub use self::scorer::{FusedScores, ScoreFuser, min_max_normalize};
pub use self::searcher::HybridSearcher;
pub use self::selector::{ResultSelector, SelectionFilter};
pub use self::types::{ScoredPassage, SearchRequest, SearchResults};
