//! The hybrid search pipeline over one set of built indexes.

use std::time::Instant;

use tracing::debug;

use crate::embedding::embedder::Embedder;
use crate::error::Result;
use crate::hybrid::candidate::CandidateGenerator;
use crate::hybrid::config::RetrieverConfig;
use crate::hybrid::scorer::ScoreFuser;
use crate::hybrid::selector::ResultSelector;
use crate::hybrid::types::{ScoredPassage, SearchRequest, SearchResults};
use crate::lexical::bm25::Bm25Index;
use crate::passage::store::PassageStore;
use crate::query::QueryEncoder;
use crate::vector::index::flat::FlatIndex;

/// Borrowed view of everything a query needs.
///
/// The retriever builds one from its current snapshot; every borrowed part
/// comes from the same snapshot, so positions agree across indexes.
pub struct HybridSearcher<'a> {
    store: &'a PassageStore,
    lexical: &'a Bm25Index,
    vectors: &'a FlatIndex,
    embedder: &'a dyn Embedder,
    encoder: &'a QueryEncoder,
    config: &'a RetrieverConfig,
}

impl<'a> HybridSearcher<'a> {
    /// Assemble a searcher from built parts.
    pub fn new(
        store: &'a PassageStore,
        lexical: &'a Bm25Index,
        vectors: &'a FlatIndex,
        embedder: &'a dyn Embedder,
        encoder: &'a QueryEncoder,
        config: &'a RetrieverConfig,
    ) -> Self {
        Self {
            store,
            lexical,
            vectors,
            embedder,
            encoder,
            config,
        }
    }

    /// Run one search.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        request.validate()?;
        let start = Instant::now();

        let query = self.encoder.encode(&request.query, self.embedder)?;
        let lexical = request.scoring.score(self.lexical, &query.tokens);

        let generator = CandidateGenerator::from_config(self.config);
        let pool = if request.scoring.uses_candidate_pruning() {
            generator.generate(&lexical, &query.vector, self.vectors)?
        } else {
            generator.exhaustive(&query.vector, self.vectors)?
        };

        let fuser = ScoreFuser::new(request.alpha, self.config.normalization_epsilon)?;
        let fused = fuser.fuse(&lexical, &pool.dense_vector_scores())?;
        let ranking = fused.ranking();

        let selector = ResultSelector::new(request.top_k, self.config.restrict_to_candidates);
        let selected = selector.select(&ranking, self.store, &request.filter, &pool);

        let mut results = Vec::with_capacity(selected.len());
        for position in selected {
            let Some(passage) = self.store.get(position) else {
                continue;
            };
            results.push(ScoredPassage {
                position,
                passage: passage.clone(),
                score: fused.fused[position],
                lexical_score: fused.lexical[position],
                vector_score: fused.vector[position],
                raw_lexical_score: lexical[position],
                raw_vector_score: pool.vector_score(position),
            });
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            query = %query.text,
            scoring = request.scoring.name(),
            alpha = request.alpha,
            candidates = pool.len(),
            reranked = pool.hits().len(),
            returned = results.len(),
            elapsed_ms,
            "hybrid search finished"
        );

        Ok(SearchResults {
            results,
            query: query.text,
            scoring: request.scoring.name().to_string(),
            passages_searched: self.store.len(),
            candidate_count: pool.len(),
            reranked_count: pool.hits().len(),
            elapsed_ms,
        })
    }
}
