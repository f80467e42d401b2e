use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tempfile::NamedTempFile;

use lorekeeper::embedding::{Embedder, HashedEmbedder};
use lorekeeper::error::{LorekeeperError, Result};
use lorekeeper::hybrid::config::RetrieverConfig;
use lorekeeper::passage::jsonl::load_passages;
use lorekeeper::passage::{Passage, SourceFilter};
use lorekeeper::retriever::{BuildHandle, Retriever};
use lorekeeper::vector::Vector;

fn hashed() -> Arc<dyn Embedder> {
    Arc::new(HashedEmbedder::new(64).unwrap())
}

fn first_set() -> Vec<Passage> {
    vec![
        Passage::new("old-1", "Goblins ambush the caravan on the north road.", "combat"),
        Passage::new("old-2", "The innkeeper hides a map under the bar.", "location"),
        Passage::new("old-3", "Roll initiative when the goblins attack.", "combat"),
    ]
}

fn second_set() -> Vec<Passage> {
    vec![
        Passage::new("new-1", "Dragons breathe fire in a cone.", "combat"),
        Passage::new("new-2", "The goblin chief demands tribute.", "narrative"),
        Passage::new("new-3", "Ships leave the harbor at high tide.", "location"),
        Passage::new("new-4", "Goblins flee from bright light.", "combat"),
    ]
}

/// Embeds normally until `fail_after` batches have been served.
struct FlakyEmbedder {
    inner: HashedEmbedder,
    calls: AtomicUsize,
    fail_after: usize,
}

impl Embedder for FlakyEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(LorekeeperError::embedding_unavailable("model server unreachable"));
        }
        self.inner.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Cancels its build handle on the first batch it embeds.
struct CancellingEmbedder {
    inner: HashedEmbedder,
    handle: BuildHandle,
}

impl Embedder for CancellingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        self.handle.cancel();
        self.inner.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        "cancelling"
    }
}

#[test]
fn test_query_before_initialize() {
    let retriever = Retriever::new();
    assert!(matches!(
        retriever.search("goblins", 3, 0.2),
        Err(LorekeeperError::NotInitialized)
    ));
    assert!(retriever.snapshot().is_none());
}

#[test]
fn test_empty_corpus_leaves_retriever_uninitialized() {
    let retriever = Retriever::new();
    let err = retriever.initialize(Vec::new(), hashed()).unwrap_err();

    assert!(matches!(err, LorekeeperError::EmptyCorpus));
    assert!(!retriever.status().initialized);
    assert!(matches!(
        retriever.search("goblins", 3, 0.2),
        Err(LorekeeperError::NotInitialized)
    ));
}

#[test]
fn test_reinitialize_with_disjoint_set() {
    let retriever = Retriever::new();
    retriever.initialize(first_set(), hashed()).unwrap();
    retriever.initialize(second_set(), hashed()).unwrap();

    for query in ["goblins ambush", "innkeeper map", "roll initiative", "dragons"] {
        let results = retriever.search(query, 10, 0.5).unwrap();
        assert!(results.ids().iter().all(|id| id.starts_with("new-")), "{query}");
    }
    assert_eq!(retriever.status().passage_count, 4);
    assert_eq!(retriever.status().generation, 2);
}

#[test]
fn test_failed_reinitialization_keeps_previous_snapshot() {
    let retriever = Retriever::with_config(RetrieverConfig {
        embed_batch_size: 1,
        ..RetrieverConfig::default()
    })
    .unwrap();
    retriever.initialize(first_set(), hashed()).unwrap();
    let before = retriever.status();

    let flaky = Arc::new(FlakyEmbedder {
        inner: HashedEmbedder::new(64).unwrap(),
        calls: AtomicUsize::new(0),
        fail_after: 2,
    });
    let err = retriever.initialize(second_set(), flaky).unwrap_err();
    assert!(matches!(err, LorekeeperError::EmbeddingUnavailable(_)));

    assert_eq!(retriever.status(), before);
    let results = retriever.search("goblins", 10, 0.5).unwrap();
    assert!(results.ids().iter().all(|id| id.starts_with("old-")));
}

#[test]
fn test_cancelled_reinitialization_publishes_nothing() {
    let retriever = Retriever::new();
    retriever.initialize(first_set(), hashed()).unwrap();
    let before = retriever.snapshot().unwrap().id();

    let handle = BuildHandle::new();
    let embedder = Arc::new(CancellingEmbedder {
        inner: HashedEmbedder::new(64).unwrap(),
        handle: handle.clone(),
    });
    let err = retriever
        .initialize_with(second_set(), embedder, &handle)
        .unwrap_err();

    assert!(matches!(err, LorekeeperError::Cancelled(_)));
    assert_eq!(retriever.snapshot().unwrap().id(), before);
}

#[test]
fn test_concurrent_queries_see_one_consistent_snapshot() {
    let retriever = Arc::new(Retriever::new());
    retriever.initialize(first_set(), hashed()).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            let retriever = Arc::clone(&retriever);
            scope.spawn(move || {
                for _ in 0..50 {
                    let results = retriever.search("goblins", 10, 0.5).unwrap();
                    let ids = results.ids();
                    let all_old = ids.iter().all(|id| id.starts_with("old-"));
                    let all_new = ids.iter().all(|id| id.starts_with("new-"));
                    assert!(all_old || all_new, "mixed snapshot: {ids:?}");
                }
            });
        }

        for i in 0..10 {
            let set = if i % 2 == 0 { second_set() } else { first_set() };
            retriever.initialize(set, hashed()).unwrap();
        }
    });
}

#[test]
fn test_status_pairs_snapshot_with_its_generation() {
    let retriever = Arc::new(Retriever::new());
    let first = retriever.initialize(first_set(), hashed()).unwrap();

    let (published, observed) = thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let retriever = Arc::clone(&retriever);
                scope.spawn(move || {
                    (0..200)
                        .filter_map(|_| {
                            let status = retriever.status();
                            status.snapshot_id.map(|id| (id, status.generation))
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut published = HashMap::from([(first.snapshot_id, first.generation)]);
        for i in 0..10 {
            let set = if i % 2 == 0 { second_set() } else { first_set() };
            let report = retriever.initialize(set, hashed()).unwrap();
            published.insert(report.snapshot_id, report.generation);
        }

        let observed: Vec<_> = readers
            .into_iter()
            .flat_map(|reader| reader.join().unwrap())
            .collect();
        (published, observed)
    });

    assert_eq!(first.generation, 1);
    assert_eq!(published.len(), 11);
    for (id, generation) in observed {
        assert_eq!(published.get(&id), Some(&generation), "snapshot {id}");
    }
    assert_eq!(retriever.status().generation, 11);
}

#[tokio::test]
async fn test_initialize_async() {
    let retriever = Arc::new(Retriever::new());
    let report = retriever
        .initialize_async(second_set(), hashed(), BuildHandle::new())
        .await
        .unwrap();

    assert_eq!(report.passage_count, 4);
    let results = retriever.search("goblins light", 2, 0.5).unwrap();
    assert!(!results.is_empty());
}

#[tokio::test]
async fn test_initialize_async_cancelled() {
    let retriever = Arc::new(Retriever::new());
    let handle = BuildHandle::new();
    handle.cancel();

    let err = retriever
        .initialize_async(second_set(), hashed(), handle)
        .await
        .unwrap_err();
    assert!(matches!(err, LorekeeperError::Cancelled(_)));
    assert!(!retriever.is_initialized());
}

#[test]
fn test_source_filter_keeps_rule_book() {
    let mut file = NamedTempFile::new().unwrap();
    let lines = [
        r#"{"chunk_id": "rb-1", "text": "Advantage means rolling two dice.", "section_type": "combat", "source_doc": "rule_book", "genre": "core_rules", "section_hierarchy": ["Rules", "Dice"]}"#,
        r#"{"chunk_id": "lm-1", "text": "Cragmaw goblins hold the cave.", "section_type": "location", "source_doc": "lost_mine", "genre": "adventure"}"#,
        "",
        r#"{"chunk_id": "ds-1", "text": "A dragon circles the keep.", "section_type": "narrative", "source_doc": "dragon_keep", "genre": "adventure"}"#,
    ];
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }

    let passages = load_passages(file.path(), &SourceFilter::source("lost_mine")).unwrap();
    let ids: Vec<&str> = passages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["rb-1", "lm-1"]);

    let retriever = Retriever::new();
    retriever.initialize(passages, hashed()).unwrap();
    let results = retriever.search("dragon", 5, 0.5).unwrap();
    assert!(!results.ids().contains(&"ds-1"));
}
