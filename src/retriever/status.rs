//! Status and build reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::retriever::snapshot::IndexSnapshot;

/// Point-in-time view of a retriever handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverStatus {
    /// Whether a snapshot is installed.
    pub initialized: bool,
    /// Indexed passages (zero when uninitialized).
    pub passage_count: usize,
    /// Distinct lexical terms.
    pub vocabulary_size: usize,
    /// Average passage length in tokens.
    pub avg_passage_len: f32,
    /// Embedding dimension.
    pub dimension: Option<usize>,
    /// Embedding source identifier.
    pub embedder: Option<String>,
    /// Tokenizer used by the installed snapshot.
    pub tokenizer: Option<String>,
    /// Installed snapshot generation.
    pub snapshot_id: Option<Uuid>,
    /// When the installed snapshot was built.
    pub built_at: Option<DateTime<Utc>>,
    /// Publication counter of the installed snapshot, or of the last one
    /// published when uninitialized.
    pub generation: u64,
}

impl RetrieverStatus {
    /// Status of a handle with no snapshot.
    pub fn uninitialized(generation: u64) -> Self {
        Self {
            initialized: false,
            passage_count: 0,
            vocabulary_size: 0,
            avg_passage_len: 0.0,
            dimension: None,
            embedder: None,
            tokenizer: None,
            snapshot_id: None,
            built_at: None,
            generation,
        }
    }

    /// Status of a handle serving `snapshot`.
    pub fn from_snapshot(snapshot: &IndexSnapshot) -> Self {
        Self {
            initialized: true,
            passage_count: snapshot.passage_count(),
            vocabulary_size: snapshot.lexical().vocabulary_len(),
            avg_passage_len: snapshot.lexical().avg_doc_len(),
            dimension: Some(snapshot.dimension()),
            embedder: Some(snapshot.embedder().name().to_string()),
            tokenizer: Some(snapshot.tokenizer().name().to_string()),
            snapshot_id: Some(snapshot.id()),
            built_at: Some(snapshot.built_at()),
            generation: snapshot.generation(),
        }
    }
}

/// Summary of one successful index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Generation identifier of the new snapshot.
    pub snapshot_id: Uuid,
    /// Indexed passages.
    pub passage_count: usize,
    /// Distinct lexical terms.
    pub vocabulary_size: usize,
    /// Embedding dimension.
    pub dimension: usize,
    /// Embedding source identifier.
    pub embedder: String,
    /// Tokenizer used for passages and queries.
    pub tokenizer: String,
    /// Publication counter the snapshot was installed under; zero if it was
    /// built but not installed.
    pub generation: u64,
    /// Embedder calls made.
    pub embed_batches: usize,
    /// Time spent building the lexical index.
    pub lexical_ms: f64,
    /// Time spent embedding and building the vector index.
    pub vector_ms: f64,
    /// Total build time.
    pub total_ms: f64,
    /// Build completion time.
    pub built_at: DateTime<Utc>,
}
