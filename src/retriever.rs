//! The retriever handle and its lifecycle.
//!
//! A [`Retriever`] is either uninitialized or serving one
//! [`IndexSnapshot`]. Initialization builds a complete snapshot off to the
//! side and then swaps it in under a short write lock; queries clone the
//! current `Arc` under a read lock and release it before doing any work.
//! A failed or cancelled build leaves the previous snapshot serving.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lorekeeper::embedding::HashedEmbedder;
//! use lorekeeper::passage::Passage;
//! use lorekeeper::retriever::Retriever;
//!
//! let retriever = Retriever::new();
//! retriever
//!     .initialize(
//!         vec![
//!             Passage::new("p1", "Goblins ambush the caravan at dusk.", "combat"),
//!             Passage::new("p2", "The tavern keeper knows every rumor.", "location"),
//!             Passage::new("p3", "Dragons sleep on beds of gold.", "narrative"),
//!         ],
//!         Arc::new(HashedEmbedder::default()),
//!     )
//!     .unwrap();
//!
//! let results = retriever.search("goblins ambush", 1, 1.0).unwrap();
//! assert_eq!(results.ids(), vec!["p1"]);
//! ```

pub mod builder;
pub mod snapshot;
pub mod status;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::embedding::embedder::Embedder;
use crate::error::{LorekeeperError, Result};
use crate::hybrid::config::RetrieverConfig;
use crate::hybrid::types::{SearchRequest, SearchResults};
use crate::passage::store::Passage;

pub use self::builder::{BuildHandle, SnapshotBuilder};
pub use self::snapshot::IndexSnapshot;
pub use self::status::{BuildReport, RetrieverStatus};

/// Handle owning the current index snapshot.
pub struct Retriever {
    config: RetrieverConfig,
    tokenizer: Arc<dyn Tokenizer>,
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    generation: AtomicU64,
}

impl Retriever {
    /// Create an uninitialized retriever with the default configuration.
    pub fn new() -> Self {
        Self {
            config: RetrieverConfig::default(),
            tokenizer: Arc::new(RegexTokenizer::default()),
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Create an uninitialized retriever with a validated configuration.
    pub fn with_config(config: RetrieverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Use `tokenizer` for every later build and for the queries served by
    /// those builds, e.g. a [`LemmatizingTokenizer`](crate::analysis::lemma::LemmatizingTokenizer).
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Configuration used for builds.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Tokenizer used for builds.
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Build indexes for `passages` and install them, replacing any prior
    /// snapshot.
    pub fn initialize(&self, passages: Vec<Passage>, embedder: Arc<dyn Embedder>) -> Result<BuildReport> {
        self.initialize_with(passages, embedder, &BuildHandle::new())
    }

    /// [`Retriever::initialize`] with a cancellation handle.
    ///
    /// A cancelled build returns `Cancelled` and installs nothing.
    pub fn initialize_with(
        &self,
        passages: Vec<Passage>,
        embedder: Arc<dyn Embedder>,
        handle: &BuildHandle,
    ) -> Result<BuildReport> {
        let built = SnapshotBuilder::new(&self.config, handle)
            .with_tokenizer(Arc::clone(&self.tokenizer))
            .build(passages, embedder);

        let (snapshot, mut report) = match built {
            Ok(built) => built,
            Err(e) => {
                if self.is_initialized() {
                    warn!(error = %e, "index build failed, keeping previous snapshot");
                } else {
                    warn!(error = %e, "index build failed");
                }
                return Err(e);
            }
        };

        // The counter advances under the write lock so a snapshot and its
        // generation are always observed together.
        let (previous, generation) = {
            let mut current = self.current.write();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let previous = current.replace(Arc::new(snapshot.with_generation(generation)));
            (previous, generation)
        };
        report.generation = generation;
        info!(
            snapshot = %report.snapshot_id,
            replaced = ?previous.as_ref().map(|s| s.id()),
            generation,
            "installed index snapshot"
        );
        Ok(report)
    }

    /// Run [`Retriever::initialize_with`] on the tokio blocking pool.
    pub async fn initialize_async(
        self: &Arc<Self>,
        passages: Vec<Passage>,
        embedder: Arc<dyn Embedder>,
        handle: BuildHandle,
    ) -> Result<BuildReport> {
        let retriever = Arc::clone(self);
        tokio::task::spawn_blocking(move || retriever.initialize_with(passages, embedder, &handle))
            .await
            .map_err(|e| LorekeeperError::other(format!("index build task failed: {e}")))?
    }

    /// Search with explicit `top_k` and `alpha` and default options otherwise.
    pub fn search(&self, query: &str, top_k: usize, alpha: f32) -> Result<SearchResults> {
        self.search_with(&SearchRequest::new(query).top_k(top_k).alpha(alpha))
    }

    /// Search with a full request.
    pub fn search_with(&self, request: &SearchRequest) -> Result<SearchResults> {
        let snapshot = self.snapshot().ok_or(LorekeeperError::NotInitialized)?;
        snapshot.search(request)
    }

    /// The snapshot currently serving queries.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.current.read().clone()
    }

    /// Whether a snapshot is installed.
    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current status.
    pub fn status(&self) -> RetrieverStatus {
        let current = self.current.read();
        match current.as_ref() {
            Some(snapshot) => RetrieverStatus::from_snapshot(snapshot),
            None => RetrieverStatus::uninitialized(self.generation.load(Ordering::SeqCst)),
        }
    }

    /// Drop the installed snapshot and return to the uninitialized state.
    pub fn clear(&self) {
        if let Some(previous) = self.current.write().take() {
            info!(snapshot = %previous.id(), "cleared index snapshot");
        }
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.name())
            .field("current", &*self.current.read())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}
