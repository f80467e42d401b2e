//! Retriever configuration.
//!
//! # Examples
//!
//! ```
//! use lorekeeper::hybrid::config::RetrieverConfig;
//!
//! let config = RetrieverConfig::default();
//! assert_eq!(config.candidate_cap, 1000);
//! assert_eq!(config.rerank_cap, 50);
//! assert!(config.validate().is_ok());
//!
//! let custom: RetrieverConfig = serde_json::from_str(r#"{"rerank_cap": 20}"#).unwrap();
//! assert_eq!(custom.rerank_cap, 20);
//! assert_eq!(custom.candidate_cap, 1000);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LorekeeperError, Result};
use crate::hybrid::scorer::DEFAULT_EPSILON;
use crate::lexical::bm25::Bm25Params;
use crate::query::{DEFAULT_QUERY_TEMPLATE, validate_template};

/// Settings fixed for the lifetime of a retriever.
///
/// Per-call knobs (`top_k`, `alpha`, filter, lexical mode) live on
/// [`SearchRequest`](crate::hybrid::types::SearchRequest) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Passages kept by the lexical pruning stage.
    pub candidate_cap: usize,
    /// Passages re-ranked by inner product within the candidate pool.
    pub rerank_cap: usize,
    /// BM25 parameters.
    pub bm25: Bm25Params,
    /// Texts per embedder call during index construction.
    pub embed_batch_size: usize,
    /// Instruction template wrapped around every query before embedding.
    pub query_template: String,
    /// Epsilon added to the min-max denominator.
    pub normalization_epsilon: f32,
    /// Only passages in the lexical candidate pool may be returned.
    pub restrict_to_candidates: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            candidate_cap: 1000,
            rerank_cap: 50,
            bm25: Bm25Params::default(),
            embed_batch_size: 32,
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            normalization_epsilon: DEFAULT_EPSILON,
            restrict_to_candidates: true,
        }
    }
}

impl RetrieverConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: RetrieverConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_cap == 0 {
            return Err(LorekeeperError::invalid_config("candidate_cap must be at least 1"));
        }
        if self.rerank_cap == 0 {
            return Err(LorekeeperError::invalid_config("rerank_cap must be at least 1"));
        }
        if self.embed_batch_size == 0 {
            return Err(LorekeeperError::invalid_config(
                "embed_batch_size must be at least 1",
            ));
        }
        if !self.normalization_epsilon.is_finite() || self.normalization_epsilon <= 0.0 {
            return Err(LorekeeperError::invalid_config(
                "normalization_epsilon must be a positive number",
            ));
        }
        self.bm25.validate()?;
        validate_template(&self.query_template)
    }
}
