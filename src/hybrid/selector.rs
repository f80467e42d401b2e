//! Result selection over a fused ranking.

use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;

use crate::hybrid::candidate::CandidatePool;
use crate::passage::store::{Passage, PassageStore};

/// Predicate type for [`SelectionFilter::Custom`].
pub type PassagePredicate = Arc<dyn Fn(&Passage) -> bool + Send + Sync>;

/// Category filter applied while walking the ranking.
///
/// # Examples
///
/// ```
/// use lorekeeper::hybrid::selector::SelectionFilter;
/// use lorekeeper::passage::Passage;
///
/// let combat = SelectionFilter::section_type("combat");
/// assert!(combat.accepts(&Passage::new("p1", "Roll initiative.", "combat")));
/// assert!(!combat.accepts(&Passage::new("p2", "The tavern is quiet.", "location")));
///
/// let short = SelectionFilter::custom(|p: &Passage| p.text.len() < 20);
/// assert!(short.accepts(&Passage::new("p3", "Short.", "narrative")));
/// ```
#[derive(Clone, Default)]
pub enum SelectionFilter {
    /// Every passage is eligible.
    #[default]
    Any,
    /// Only passages with this section type.
    SectionType(String),
    /// Caller-supplied predicate.
    Custom(PassagePredicate),
}

impl SelectionFilter {
    /// Filter on an exact section type.
    pub fn section_type<S: Into<String>>(section_type: S) -> Self {
        SelectionFilter::SectionType(section_type.into())
    }

    /// Filter with a closure.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Passage) -> bool + Send + Sync + 'static,
    {
        SelectionFilter::Custom(Arc::new(predicate))
    }

    /// Whether `passage` passes the filter.
    pub fn accepts(&self, passage: &Passage) -> bool {
        match self {
            SelectionFilter::Any => true,
            SelectionFilter::SectionType(section_type) => passage.section_type == *section_type,
            SelectionFilter::Custom(predicate) => predicate(passage),
        }
    }
}

impl fmt::Debug for SelectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionFilter::Any => write!(f, "Any"),
            SelectionFilter::SectionType(section_type) => {
                f.debug_tuple("SectionType").field(section_type).finish()
            }
            SelectionFilter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Walks a fused ranking and picks the passages to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSelector {
    top_k: usize,
    restrict_to_candidates: bool,
}

impl ResultSelector {
    /// Create a selector returning at most `top_k` passages.
    pub fn new(top_k: usize, restrict_to_candidates: bool) -> Self {
        Self {
            top_k,
            restrict_to_candidates,
        }
    }

    /// Select passage positions in ranking order.
    ///
    /// A passage is skipped when it lies outside the candidate pool (if
    /// restricted), fails the filter, or repeats the exact text of a passage
    /// already selected. Fewer than `top_k` survivors is not an error.
    pub fn select(
        &self,
        ranking: &[usize],
        store: &PassageStore,
        filter: &SelectionFilter,
        pool: &CandidatePool,
    ) -> Vec<usize> {
        let mut selected = Vec::with_capacity(self.top_k.min(ranking.len()));
        let mut seen: AHashSet<&str> = AHashSet::new();

        for &position in ranking {
            if selected.len() >= self.top_k {
                break;
            }
            if self.restrict_to_candidates && !pool.contains(position) {
                continue;
            }
            let Some(passage) = store.get(position) else {
                continue;
            };
            if !filter.accepts(passage) {
                continue;
            }
            if !seen.insert(passage.text.as_str()) {
                continue;
            }
            selected.push(position);
        }

        selected
    }
}
