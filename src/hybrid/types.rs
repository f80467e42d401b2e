//! Request and result types for hybrid search.

use serde::Serialize;

use crate::error::{LorekeeperError, Result};
use crate::hybrid::selector::SelectionFilter;
use crate::lexical::scoring::LexicalScoring;
use crate::passage::store::Passage;

/// Passages returned when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// Default lexical weight in fusion.
pub const DEFAULT_ALPHA: f32 = 0.2;

/// Parameters for one search call.
///
/// # Examples
///
/// ```
/// use lorekeeper::hybrid::types::SearchRequest;
///
/// let request = SearchRequest::new("grapple rules");
/// assert_eq!(request.top_k, 5);
/// assert_eq!(request.alpha, 0.2);
///
/// assert!(SearchRequest::new("grapple rules").alpha(1.5).validate().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Raw query text.
    pub query: String,
    /// Maximum number of passages to return.
    pub top_k: usize,
    /// Lexical weight in `[0, 1]`; `1 - alpha` weighs the vector score.
    pub alpha: f32,
    /// Category filter.
    pub filter: SelectionFilter,
    /// How the lexical score is computed.
    pub scoring: LexicalScoring,
}

impl SearchRequest {
    /// Create a request with default parameters.
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
            filter: SelectionFilter::Any,
            scoring: LexicalScoring::Joint,
        }
    }

    /// Set the maximum number of passages.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the lexical weight.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the category filter.
    pub fn filter(mut self, filter: SelectionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Keep only passages of one section type.
    pub fn section_type<S: Into<String>>(self, section_type: S) -> Self {
        self.filter(SelectionFilter::section_type(section_type))
    }

    /// Set the lexical scoring mode.
    pub fn scoring(mut self, scoring: LexicalScoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(LorekeeperError::invalid_argument("top_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(LorekeeperError::invalid_argument(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// One selected passage with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPassage {
    /// Position in the passage store.
    pub position: usize,
    /// The passage.
    pub passage: Passage,
    /// Fused score.
    pub score: f32,
    /// Normalized lexical score.
    pub lexical_score: f32,
    /// Normalized vector score.
    pub vector_score: f32,
    /// Raw BM25 (or weighted BM25) score.
    pub raw_lexical_score: f32,
    /// Raw inner product, present only for re-ranked passages.
    pub raw_vector_score: Option<f32>,
}

/// Ranked output of one search call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Selected passages, best first.
    pub results: Vec<ScoredPassage>,
    /// Normalized query text.
    pub query: String,
    /// Lexical mode used ("joint" or "weighted").
    pub scoring: String,
    /// Passages in the snapshot.
    pub passages_searched: usize,
    /// Size of the lexical candidate pool.
    pub candidate_count: usize,
    /// Passages re-ranked by inner product.
    pub reranked_count: usize,
    /// Wall-clock time of the search in milliseconds.
    pub elapsed_ms: f64,
}

impl SearchResults {
    /// Number of selected passages.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get the best (highest scoring) result.
    pub fn best_result(&self) -> Option<&ScoredPassage> {
        self.results.first()
    }

    /// Selected passages in rank order.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.results.iter().map(|r| &r.passage)
    }

    /// Identifiers of the selected passages in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.passages().map(|p| p.id.as_str()).collect()
    }

    /// Selected texts joined by a blank line, ready for prompt assembly.
    pub fn context(&self) -> String {
        self.passages()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
