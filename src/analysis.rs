//! Text analysis for lexical scoring.
//!
//! This module provides the single tokenization rule shared by the lexical
//! index and the query encoder, an optional lemmatizing wrapper around it, and
//! keyword utilities used by the weighted lexical scoring mode.

pub mod keywords;
pub mod lemma;
pub mod tokenizer;

pub use self::keywords::{KeywordWeights, expand_compounds};
pub use self::lemma::{LemmaTable, Lemmatizer, LemmatizingTokenizer, PluralLemmatizer};
pub use self::tokenizer::Tokenizer;
pub use self::tokenizer::regex::RegexTokenizer;
