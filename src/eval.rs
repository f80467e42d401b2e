//! Retrieval evaluation against ground-truth passage ids.
//!
//! Each [`EvalQuery`] names the passages that should answer it. Evaluation
//! runs every query through one snapshot and reports, per query and averaged:
//!
//! - **precision@k**: relevant passages retrieved, divided by `k`
//! - **recall@k**: relevant passages retrieved, divided by the relevant count
//! - **semantic similarity@k**: for each retrieved passage, its best cosine
//!   against the relevant passages' embeddings, averaged over the retrieved
//!   passages
//!
//! Query files use the JSONL layout of generated question sets:
//! ```jsonl
//! {"query": "How do I gain a level?", "positive_contexts": [{"id": "r_0154", "text": "..."}]}
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LorekeeperError, Result};
use crate::hybrid::types::SearchRequest;
use crate::retriever::Retriever;
use crate::retriever::snapshot::IndexSnapshot;
use crate::util::simd;

/// Default cut-off for evaluation.
pub const DEFAULT_EVAL_K: usize = 3;

/// Default lexical weight for evaluation searches.
pub const DEFAULT_EVAL_ALPHA: f32 = 0.5;

/// Semantic similarity above which retrieved context counts as on-topic.
pub const RELEVANCE_THRESHOLD: f32 = 0.5;

/// One passage that answers an evaluation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveContext {
    /// Passage id.
    pub id: String,
    /// Passage text as recorded when the question was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A query with its ground-truth passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalQuery {
    pub query: String,
    pub positive_contexts: Vec<PositiveContext>,
}

impl EvalQuery {
    /// Create a query whose answers are the given passage ids.
    pub fn new<Q, I, S>(query: Q, relevant_ids: I) -> Self
    where
        Q: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.into(),
            positive_contexts: relevant_ids
                .into_iter()
                .map(|id| PositiveContext {
                    id: id.into(),
                    text: None,
                })
                .collect(),
        }
    }

    /// Distinct ground-truth ids.
    pub fn relevant_ids(&self) -> AHashSet<&str> {
        self.positive_contexts.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Scores for one evaluated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub query: String,
    /// Ground-truth ids, sorted.
    pub relevant_ids: Vec<String>,
    /// Retrieved ids in rank order.
    pub retrieved_ids: Vec<String>,
    /// Retrieved ids that are relevant.
    pub hits: usize,
    pub precision: f32,
    pub recall: f32,
    /// `None` when no ground-truth passage is in the index or nothing was
    /// retrieved.
    pub semantic_similarity: Option<f32>,
}

impl QueryEvaluation {
    /// Whether the retrieved context is on-topic, when that can be judged.
    pub fn is_semantically_relevant(&self) -> Option<bool> {
        self.semantic_similarity.map(|s| s > RELEVANCE_THRESHOLD)
    }
}

/// Aggregate evaluation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Cut-off used for every query.
    pub k: usize,
    /// Lexical weight used for every query.
    pub alpha: f32,
    /// Snapshot the queries ran against.
    pub snapshot_id: Uuid,
    pub queries: Vec<QueryEvaluation>,
    pub mean_precision: f32,
    pub mean_recall: f32,
    /// Mean over the queries that have a semantic similarity.
    pub mean_semantic_similarity: Option<f32>,
    pub evaluated_at: DateTime<Utc>,
    pub elapsed_ms: f64,
}

/// Runs evaluation queries with a fixed `k` and `alpha`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    k: usize,
    alpha: f32,
}

impl Evaluator {
    /// Create an evaluator, rejecting `k == 0` and `alpha` outside `[0, 1]`.
    pub fn new(k: usize, alpha: f32) -> Result<Self> {
        if k == 0 {
            return Err(LorekeeperError::invalid_argument("k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&alpha) {
            return Err(LorekeeperError::invalid_argument(format!(
                "alpha must be in [0, 1], got {alpha}"
            )));
        }
        Ok(Self { k, alpha })
    }

    /// Evaluate against the retriever's current snapshot.
    pub fn evaluate(&self, retriever: &Retriever, queries: &[EvalQuery]) -> Result<EvalReport> {
        let snapshot = retriever.snapshot().ok_or(LorekeeperError::NotInitialized)?;
        self.evaluate_snapshot(&snapshot, queries)
    }

    /// Evaluate against one snapshot.
    pub fn evaluate_snapshot(&self, snapshot: &IndexSnapshot, queries: &[EvalQuery]) -> Result<EvalReport> {
        if queries.is_empty() {
            return Err(LorekeeperError::invalid_argument("no evaluation queries"));
        }
        let start = Instant::now();

        let evaluations = queries
            .iter()
            .map(|query| self.evaluate_query(snapshot, query))
            .collect::<Result<Vec<_>>>()?;

        let count = evaluations.len() as f32;
        let mean_precision = evaluations.iter().map(|e| e.precision).sum::<f32>() / count;
        let mean_recall = evaluations.iter().map(|e| e.recall).sum::<f32>() / count;
        let similarities: Vec<f32> = evaluations.iter().filter_map(|e| e.semantic_similarity).collect();
        let mean_semantic_similarity =
            (!similarities.is_empty()).then(|| similarities.iter().sum::<f32>() / similarities.len() as f32);

        let report = EvalReport {
            k: self.k,
            alpha: self.alpha,
            snapshot_id: snapshot.id(),
            queries: evaluations,
            mean_precision,
            mean_recall,
            mean_semantic_similarity,
            evaluated_at: Utc::now(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        info!(
            queries = report.queries.len(),
            k = report.k,
            mean_precision = report.mean_precision,
            mean_recall = report.mean_recall,
            mean_semantic_similarity = ?report.mean_semantic_similarity,
            "evaluation finished"
        );
        Ok(report)
    }

    fn evaluate_query(&self, snapshot: &IndexSnapshot, query: &EvalQuery) -> Result<QueryEvaluation> {
        let relevant = query.relevant_ids();
        if relevant.is_empty() {
            return Err(LorekeeperError::invalid_argument(format!(
                "query '{}' has no ground-truth passages",
                query.query
            )));
        }

        let request = SearchRequest::new(query.query.clone())
            .top_k(self.k)
            .alpha(self.alpha);
        let results = snapshot.search(&request)?;

        let retrieved_ids: Vec<String> = results.ids().into_iter().map(str::to_string).collect();
        let hits = retrieved_ids
            .iter()
            .collect::<AHashSet<_>>()
            .into_iter()
            .filter(|id| relevant.contains(id.as_str()))
            .count();

        let relevant_positions: Vec<usize> = relevant
            .iter()
            .filter_map(|id| snapshot.store().position(id))
            .collect();
        let retrieved_positions: Vec<usize> = results.results.iter().map(|hit| hit.position).collect();
        let semantic_similarity = semantic_similarity(snapshot, &retrieved_positions, &relevant_positions);

        let relevant_ids: Vec<String> = relevant
            .iter()
            .map(|id| id.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let evaluation = QueryEvaluation {
            query: query.query.clone(),
            precision: hits as f32 / self.k as f32,
            recall: hits as f32 / relevant_ids.len() as f32,
            relevant_ids,
            retrieved_ids,
            hits,
            semantic_similarity,
        };
        debug!(
            query = %evaluation.query,
            hits = evaluation.hits,
            precision = evaluation.precision,
            recall = evaluation.recall,
            semantic_similarity = ?evaluation.semantic_similarity,
            "evaluated query"
        );
        Ok(evaluation)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            k: DEFAULT_EVAL_K,
            alpha: DEFAULT_EVAL_ALPHA,
        }
    }
}

/// Evaluate `queries` against the retriever's current snapshot at cut-off `k`
/// with the default alpha.
pub fn evaluate(retriever: &Retriever, queries: &[EvalQuery], k: usize) -> Result<EvalReport> {
    Evaluator::new(k, DEFAULT_EVAL_ALPHA)?.evaluate(retriever, queries)
}

/// Mean over `retrieved` of the best cosine against any of `relevant`.
///
/// Index rows are unit vectors from the snapshot's embedder, so the inner
/// product is the cosine.
fn semantic_similarity(snapshot: &IndexSnapshot, retrieved: &[usize], relevant: &[usize]) -> Option<f32> {
    let vectors = snapshot.vectors();
    let relevant_rows: Vec<&[f32]> = relevant.iter().filter_map(|&i| vectors.row(i)).collect();
    if relevant_rows.is_empty() {
        return None;
    }

    let best: Vec<f32> = retrieved
        .iter()
        .filter_map(|&i| vectors.row(i))
        .map(|row| {
            relevant_rows
                .iter()
                .map(|gt| simd::dot_product(row, gt))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .collect();
    if best.is_empty() {
        return None;
    }
    Some(best.iter().sum::<f32>() / best.len() as f32)
}

/// Read evaluation queries from a JSONL file.
pub fn load_eval_queries<P: AsRef<Path>>(path: P) -> Result<Vec<EvalQuery>> {
    let file = File::open(path.as_ref())?;
    read_eval_queries(file)
}

/// Read evaluation queries from any JSONL reader; blank lines are skipped.
pub fn read_eval_queries<R: Read>(reader: R) -> Result<Vec<EvalQuery>> {
    let reader = BufReader::new(reader);
    let mut queries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let query: EvalQuery = serde_json::from_str(trimmed)
            .map_err(|e| LorekeeperError::parse(line_num + 1, e.to_string()))?;
        queries.push(query);
    }

    Ok(queries)
}
