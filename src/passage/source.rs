//! Per-session passage source selection.

use serde::{Deserialize, Serialize};

use crate::passage::store::Passage;

/// Genre tag of the always-available core rules.
pub const CORE_RULES_GENRE: &str = "core_rules";

/// Source document that carries the core rules.
pub const RULE_BOOK_SOURCE: &str = "rule_book";

/// Selects which passages a session indexes.
///
/// When a source is selected, only passages from that source document are
/// kept, except that core-rule passages from the rule book are always kept.
/// With no source selected every passage is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilter {
    /// Selected source document, if any.
    pub source: Option<String>,
}

impl SourceFilter {
    /// A filter that keeps every passage.
    pub fn all() -> Self {
        Self { source: None }
    }

    /// A filter restricted to one source document plus the rule book.
    pub fn source<S: Into<String>>(source: S) -> Self {
        Self {
            source: Some(source.into()),
        }
    }

    /// Whether the passage belongs to the always-included core rules.
    pub fn is_core_rule(passage: &Passage) -> bool {
        passage.genre == CORE_RULES_GENRE && passage.source_doc == RULE_BOOK_SOURCE
    }

    /// Whether this filter keeps the passage.
    pub fn accepts(&self, passage: &Passage) -> bool {
        if Self::is_core_rule(passage) {
            return true;
        }
        match &self.source {
            Some(source) => passage.source_doc == *source,
            None => true,
        }
    }

    /// Keep only accepted passages, preserving order.
    pub fn apply(&self, passages: Vec<Passage>) -> Vec<Passage> {
        passages.into_iter().filter(|p| self.accepts(p)).collect()
    }
}
