//! Passage record and ordered passage store.

use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One retrievable unit of text with metadata.
///
/// Field names follow the ingestion output, so `chunk_id` is accepted as the
/// identifier when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Unique passage identifier.
    #[serde(alias = "chunk_id")]
    pub id: String,
    /// Raw passage text.
    pub text: String,
    /// Section-type tag, e.g. "combat", "narrative", "location".
    pub section_type: String,
    /// Identifier of the source document this passage was cut from.
    #[serde(default)]
    pub source_doc: String,
    /// Genre tag, e.g. "core_rules" or "adventure".
    #[serde(default)]
    pub genre: String,
    /// Section path from the document root down to this passage.
    #[serde(default)]
    pub section_hierarchy: Vec<String>,
}

impl Passage {
    /// Create a passage with empty source, genre and hierarchy.
    pub fn new<I, T, S>(id: I, text: T, section_type: S) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            text: text.into(),
            section_type: section_type.into(),
            source_doc: String::new(),
            genre: String::new(),
            section_hierarchy: Vec::new(),
        }
    }

    /// Set the source document identifier.
    pub fn with_source_doc<S: Into<String>>(mut self, source_doc: S) -> Self {
        self.source_doc = source_doc.into();
        self
    }

    /// Set the genre tag.
    pub fn with_genre<S: Into<String>>(mut self, genre: S) -> Self {
        self.genre = genre.into();
        self
    }

    /// Set the section hierarchy.
    pub fn with_hierarchy<I, S>(mut self, hierarchy: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.section_hierarchy = hierarchy.into_iter().map(Into::into).collect();
        self
    }
}

/// Ordered, immutable collection of passages.
///
/// Positions are stable for the lifetime of the store. Cloning is cheap: the
/// passages live behind an `Arc` and are shared, never copied.
#[derive(Debug, Clone, Default)]
pub struct PassageStore {
    passages: Arc<[Passage]>,
}

impl PassageStore {
    /// Create a store from passages in their final order.
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            passages: passages.into(),
        }
    }

    /// Number of passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the store holds no passages.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Get the passage at `index`.
    pub fn get(&self, index: usize) -> Option<&Passage> {
        self.passages.get(index)
    }

    /// Iterate passages in store order.
    pub fn iter(&self) -> std::slice::Iter<'_, Passage> {
        self.passages.iter()
    }

    /// Borrow all passage texts in store order.
    pub fn texts(&self) -> Vec<&str> {
        self.passages.iter().map(|p| p.text.as_str()).collect()
    }

    /// Find the position of a passage by identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.passages.iter().position(|p| p.id == id)
    }

    /// Borrow the passages as a slice.
    pub fn as_slice(&self) -> &[Passage] {
        &self.passages
    }
}

impl Index<usize> for PassageStore {
    type Output = Passage;

    fn index(&self, index: usize) -> &Self::Output {
        &self.passages[index]
    }
}

impl From<Vec<Passage>> for PassageStore {
    fn from(passages: Vec<Passage>) -> Self {
        Self::new(passages)
    }
}

impl<'a> IntoIterator for &'a PassageStore {
    type Item = &'a Passage;
    type IntoIter = std::slice::Iter<'a, Passage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
