//! Immutable, fully built index bundle.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analysis::tokenizer::Tokenizer;
use crate::embedding::embedder::Embedder;
use crate::error::Result;
use crate::hybrid::config::RetrieverConfig;
use crate::hybrid::searcher::HybridSearcher;
use crate::hybrid::types::{SearchRequest, SearchResults};
use crate::lexical::bm25::Bm25Index;
use crate::passage::store::PassageStore;
use crate::query::QueryEncoder;
use crate::vector::index::flat::FlatIndex;

/// One generation of built indexes.
///
/// Position `i` in the store, the lexical index and the vector index all
/// refer to the same passage. A snapshot is never modified after it is
/// built; re-initialization builds a new one.
pub struct IndexSnapshot {
    id: Uuid,
    built_at: DateTime<Utc>,
    generation: u64,
    store: PassageStore,
    lexical: Bm25Index,
    vectors: FlatIndex,
    embedder: Arc<dyn Embedder>,
    encoder: QueryEncoder,
    config: RetrieverConfig,
}

impl IndexSnapshot {
    pub(crate) fn new(
        store: PassageStore,
        lexical: Bm25Index,
        vectors: FlatIndex,
        embedder: Arc<dyn Embedder>,
        encoder: QueryEncoder,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            built_at: Utc::now(),
            generation: 0,
            store,
            lexical,
            vectors,
            embedder,
            encoder,
            config,
        }
    }

    /// Generation identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Build completion time.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Publication counter value this snapshot was installed under; zero
    /// until it is installed on a retriever.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Indexed passages.
    pub fn store(&self) -> &PassageStore {
        &self.store
    }

    /// Lexical index.
    pub fn lexical(&self) -> &Bm25Index {
        &self.lexical
    }

    /// Vector index.
    pub fn vectors(&self) -> &FlatIndex {
        &self.vectors
    }

    /// Embedding source the vectors were built with.
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Tokenizer shared by the lexical index and the query encoder.
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.encoder.tokenizer().as_ref()
    }

    /// Configuration the snapshot was built with.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Number of indexed passages.
    pub fn passage_count(&self) -> usize {
        self.store.len()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    /// A searcher borrowing this snapshot.
    pub fn searcher(&self) -> HybridSearcher<'_> {
        HybridSearcher::new(
            &self.store,
            &self.lexical,
            &self.vectors,
            self.embedder.as_ref(),
            &self.encoder,
            &self.config,
        )
    }

    /// Run one search against this snapshot.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        self.searcher().search(request)
    }
}

impl fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("id", &self.id)
            .field("built_at", &self.built_at)
            .field("generation", &self.generation)
            .field("passages", &self.store.len())
            .field("vocabulary", &self.lexical.vocabulary_len())
            .field("dimension", &self.vectors.dimension())
            .field("embedder", &self.embedder.name())
            .field("tokenizer", &self.tokenizer().name())
            .finish()
    }
}
