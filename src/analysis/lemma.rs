//! Lemmatization applied on top of a tokenizer.
//!
//! A [`LemmatizingTokenizer`] wraps any [`Tokenizer`] and maps each token to
//! its lemma, so "goblins" and "goblin" index and query as the same term.
//! Installed on a [`Retriever`](crate::retriever::Retriever), it is used for
//! both the passages and every query.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use lorekeeper::analysis::lemma::{LemmaTable, LemmatizingTokenizer, PluralLemmatizer};
//! use lorekeeper::analysis::tokenizer::Tokenizer;
//! use lorekeeper::analysis::tokenizer::regex::RegexTokenizer;
//!
//! let table = LemmaTable::from_pairs([("feet", "foot")]).with_fallback(Arc::new(PluralLemmatizer));
//! let tokenizer = LemmatizingTokenizer::new(Arc::new(RegexTokenizer::default()), Arc::new(table));
//!
//! assert_eq!(tokenizer.tokenize("Goblins' feet"), vec!["goblin", "foot"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Maps a single lower-cased token to its lemma.
pub trait Lemmatizer: Send + Sync {
    /// Lemma of `token`; tokens with no known lemma come back unchanged.
    fn lemmatize(&self, token: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

/// Rule-based English plural folding.
///
/// Handles the regular noun plurals (`-s`, `-es`, `-ies`) and leaves short
/// words and `-ss`/`-us`/`-is` endings alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluralLemmatizer;

impl Lemmatizer for PluralLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        if token.len() <= 3 || !token.is_ascii() {
            return token.to_string();
        }

        if let Some(stem) = token.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = token.strip_suffix("sses") {
            return format!("{stem}ss");
        }
        for suffix in ["ches", "shes", "xes", "zes"] {
            if token.ends_with(suffix) {
                return token[..token.len() - 2].to_string();
            }
        }
        if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
            return token.to_string();
        }
        match token.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => token.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "plural"
    }
}

/// Dictionary lemmatizer for irregular forms, with an optional rule-based
/// fallback for tokens not in the table.
#[derive(Clone, Default)]
pub struct LemmaTable {
    lemmas: AHashMap<String, String>,
    fallback: Option<Arc<dyn Lemmatizer>>,
}

impl LemmaTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(form, lemma)` pairs. Both sides are lower-cased.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (form, lemma) in pairs {
            table.insert(form, lemma);
        }
        table
    }

    /// Load a JSON object mapping forms to lemmas.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let pairs: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self::from_pairs(pairs))
    }

    /// Use `fallback` for tokens the table does not cover.
    pub fn with_fallback(mut self, fallback: Arc<dyn Lemmatizer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Add one mapping.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, form: K, lemma: V) {
        self.lemmas
            .insert(form.into().to_lowercase(), lemma.into().to_lowercase());
    }

    /// Number of mapped forms.
    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    /// Whether the table maps nothing.
    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl Lemmatizer for LemmaTable {
    fn lemmatize(&self, token: &str) -> String {
        match (self.lemmas.get(token), &self.fallback) {
            (Some(lemma), _) => lemma.clone(),
            (None, Some(fallback)) => fallback.lemmatize(token),
            (None, None) => token.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

impl fmt::Debug for LemmaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmaTable")
            .field("lemmas", &self.lemmas.len())
            .field("fallback", &self.fallback.as_ref().map(|l| l.name()))
            .finish()
    }
}

/// Tokenizer that lemmatizes the output of another tokenizer.
#[derive(Clone)]
pub struct LemmatizingTokenizer {
    inner: Arc<dyn Tokenizer>,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl LemmatizingTokenizer {
    /// Wrap `inner`, mapping every token through `lemmatizer`.
    pub fn new(inner: Arc<dyn Tokenizer>, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { inner, lemmatizer }
    }

    /// Name of the wrapped lemmatizer.
    pub fn lemmatizer_name(&self) -> &'static str {
        self.lemmatizer.name()
    }
}

impl Tokenizer for LemmatizingTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.inner
            .tokenize(text)
            .into_iter()
            .map(|token| self.lemmatizer.lemmatize(&token))
            .filter(|lemma| !lemma.is_empty())
            .collect()
    }

    fn name(&self) -> &'static str {
        "lemmatized"
    }
}

impl fmt::Debug for LemmatizingTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LemmatizingTokenizer")
            .field("inner", &self.inner.name())
            .field("lemmatizer", &self.lemmatizer.name())
            .finish()
    }
}
