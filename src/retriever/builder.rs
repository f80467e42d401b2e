//! Off-to-the-side index construction.
//!
//! A [`SnapshotBuilder`] builds every index for a passage set into a fresh
//! [`IndexSnapshot`]. Nothing is shared with the snapshot currently serving
//! queries, so a failed or cancelled build has no visible effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::embedding::embedder::Embedder;
use crate::error::{LorekeeperError, Result};
use crate::hybrid::config::RetrieverConfig;
use crate::lexical::bm25::Bm25Index;
use crate::passage::store::{Passage, PassageStore};
use crate::query::QueryEncoder;
use crate::retriever::snapshot::IndexSnapshot;
use crate::retriever::status::BuildReport;
use crate::vector::core::vector::Vector;
use crate::vector::index::flat::FlatIndex;

/// Cancellation handle for an in-flight build.
///
/// Clones share one flag, so a caller can keep a clone and cancel a build
/// running on another thread.
#[derive(Debug, Clone, Default)]
pub struct BuildHandle {
    cancel_token: Arc<AtomicBool>,
}

impl BuildHandle {
    /// Create a handle that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancel_token.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.load(Ordering::SeqCst)
    }

    /// Fail with `Cancelled` if cancellation was requested.
    pub fn check(&self, phase: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(LorekeeperError::cancelled(format!("index build cancelled during {phase}")));
        }
        Ok(())
    }
}

/// Builds a complete snapshot for one passage set.
pub struct SnapshotBuilder<'a> {
    config: &'a RetrieverConfig,
    handle: &'a BuildHandle,
    tokenizer: Arc<dyn Tokenizer>,
}

impl<'a> SnapshotBuilder<'a> {
    /// Create a builder using `config` and observing `handle`.
    pub fn new(config: &'a RetrieverConfig, handle: &'a BuildHandle) -> Self {
        Self {
            config,
            handle,
            tokenizer: Arc::new(RegexTokenizer::default()),
        }
    }

    /// Tokenize passages and queries with `tokenizer`.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Build the lexical and vector indexes for `passages`.
    pub fn build(
        &self,
        passages: Vec<Passage>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<(IndexSnapshot, BuildReport)> {
        if passages.is_empty() {
            return Err(LorekeeperError::EmptyCorpus);
        }
        self.config.validate()?;
        let encoder =
            QueryEncoder::new(self.config.query_template.clone())?.with_tokenizer(Arc::clone(&self.tokenizer));

        let start = Instant::now();
        let store = PassageStore::new(passages);

        self.handle.check("lexical indexing")?;
        let lexical = Bm25Index::build(&store, self.tokenizer.as_ref(), self.config.bm25)?;
        let lexical_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            passages = store.len(),
            vocabulary = lexical.vocabulary_len(),
            lexical_ms,
            "lexical index built"
        );

        let vector_start = Instant::now();
        let (vectors, embed_batches) = self.embed_passages(&store, embedder.as_ref())?;
        let vectors = FlatIndex::new(vectors)?;
        let vector_ms = vector_start.elapsed().as_secs_f64() * 1000.0;

        self.handle.check("publication")?;
        let snapshot = IndexSnapshot::new(
            store,
            lexical,
            vectors,
            embedder,
            encoder,
            self.config.clone(),
        );

        let report = BuildReport {
            snapshot_id: snapshot.id(),
            passage_count: snapshot.passage_count(),
            vocabulary_size: snapshot.lexical().vocabulary_len(),
            dimension: snapshot.dimension(),
            embedder: snapshot.embedder().name().to_string(),
            tokenizer: snapshot.tokenizer().name().to_string(),
            generation: 0,
            embed_batches,
            lexical_ms,
            vector_ms,
            total_ms: start.elapsed().as_secs_f64() * 1000.0,
            built_at: snapshot.built_at(),
        };
        info!(
            snapshot = %report.snapshot_id,
            passages = report.passage_count,
            dimension = report.dimension,
            embedder = %report.embedder,
            tokenizer = %report.tokenizer,
            total_ms = report.total_ms,
            "index snapshot built"
        );

        Ok((snapshot, report))
    }

    /// Embed passage texts in batches and normalize the results.
    fn embed_passages(&self, store: &PassageStore, embedder: &dyn Embedder) -> Result<(Vec<Vector>, usize)> {
        let texts = store.texts();
        let dimension = embedder.dimension();
        let mut vectors = Vec::with_capacity(texts.len());
        let mut batches = 0;

        for batch in texts.chunks(self.config.embed_batch_size) {
            self.handle.check("embedding")?;

            let embedded = embedder.embed_batch(batch).map_err(|e| match e {
                LorekeeperError::EmbeddingUnavailable(_) => e,
                other => LorekeeperError::embedding_unavailable(other.to_string()),
            })?;
            if embedded.len() != batch.len() {
                return Err(LorekeeperError::embedding_unavailable(format!(
                    "{} returned {} vectors for {} texts",
                    embedder.name(),
                    embedded.len(),
                    batch.len()
                )));
            }
            for vector in &embedded {
                vector.validate_dimension(dimension)?;
            }

            vectors.extend(embedded);
            batches += 1;
            debug!(embedded = vectors.len(), total = texts.len(), "embedded passage batch");
        }

        Vector::normalize_batch_parallel(&mut vectors);
        Ok((vectors, batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lemma::{LemmatizingTokenizer, PluralLemmatizer};
    use crate::embedding::hashed::HashedEmbedder;

    fn passages(n: usize) -> Vec<Passage> {
        (0..n)
            .map(|i| Passage::new(format!("p{i}"), format!("passage number {i} about goblins"), "combat"))
            .collect()
    }

    #[test]
    fn test_build_in_batches() {
        let config = RetrieverConfig {
            embed_batch_size: 4,
            ..RetrieverConfig::default()
        };
        let handle = BuildHandle::new();
        let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new(32).unwrap());

        let (snapshot, report) = SnapshotBuilder::new(&config, &handle)
            .build(passages(10), embedder)
            .unwrap();

        assert_eq!(report.embed_batches, 3);
        assert_eq!(report.passage_count, 10);
        assert_eq!(report.dimension, 32);
        assert_eq!(report.embedder, "hashed");
        assert_eq!(report.tokenizer, "regex");
        assert_eq!(snapshot.id(), report.snapshot_id);
        assert_eq!(snapshot.vectors().len(), snapshot.lexical().doc_count());
    }

    #[test]
    fn test_empty_corpus() {
        let config = RetrieverConfig::default();
        let handle = BuildHandle::new();
        let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::default());

        let err = SnapshotBuilder::new(&config, &handle)
            .build(Vec::new(), embedder)
            .unwrap_err();
        assert!(matches!(err, LorekeeperError::EmptyCorpus));
    }

    #[test]
    fn test_cancelled_build() {
        let config = RetrieverConfig::default();
        let handle = BuildHandle::new();
        let observer = handle.clone();
        observer.cancel();
        assert!(handle.is_cancelled());

        let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::default());
        let err = SnapshotBuilder::new(&config, &handle)
            .build(passages(3), embedder)
            .unwrap_err();
        assert!(matches!(err, LorekeeperError::Cancelled(_)));
    }

    #[test]
    fn test_handle_check() {
        let handle = BuildHandle::new();
        assert!(handle.check("embedding").is_ok());
        handle.cancel();
        assert!(handle.check("embedding").is_err());
    }

    #[test]
    fn test_index_and_queries_share_tokenizer() {
        let config = RetrieverConfig::default();
        let handle = BuildHandle::new();
        let tokenizer: Arc<dyn Tokenizer> = Arc::new(LemmatizingTokenizer::new(
            Arc::new(RegexTokenizer::default()),
            Arc::new(PluralLemmatizer),
        ));
        let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new(32).unwrap());

        let (snapshot, report) = SnapshotBuilder::new(&config, &handle)
            .with_tokenizer(tokenizer)
            .build(passages(3), embedder)
            .unwrap();

        assert_eq!(report.tokenizer, "lemmatized");
        assert_eq!(snapshot.tokenizer().name(), "lemmatized");
        assert_eq!(snapshot.lexical().document_frequency("goblin"), 3);
        assert_eq!(snapshot.lexical().document_frequency("goblins"), 0);
    }
}
