//! Command line argument parsing for the lorekeeper CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::embedding::hashed::DEFAULT_DIMENSION;
use crate::eval::{DEFAULT_EVAL_ALPHA, DEFAULT_EVAL_K};
use crate::hybrid::types::{DEFAULT_ALPHA, DEFAULT_TOP_K};

/// Lorekeeper - hybrid BM25 and dense-vector passage retrieval
#[derive(Parser, Debug, Clone)]
#[command(name = "lorekeeper")]
#[command(about = "Hybrid lexical and semantic passage retrieval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LorekeeperArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LorekeeperArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build indexes over a passage file and run one query
    Search(SearchArgs),

    /// Build indexes over a passage file and report their statistics
    Status(StatusArgs),

    /// Score retrieval against ground-truth passage ids
    Eval(EvalArgs),

    /// Show how text is tokenized for lexical scoring
    Tokenize(TokenizeArgs),
}

/// Where passages come from and how they are indexed.
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Passage file (JSONL, one passage per line)
    #[arg(value_name = "PASSAGES")]
    pub passages: PathBuf,

    /// Keep only passages from this source document (core rules are always kept)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Dimension of the hashed embedder
    #[arg(long, default_value_t = DEFAULT_DIMENSION)]
    pub dimension: usize,

    /// Retriever configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Fold regular plurals in passages and queries
    #[arg(long)]
    pub lemmatize: bool,

    /// Lemma table file (JSON object of form to lemma), applied before --lemmatize rules
    #[arg(long, value_name = "LEMMAS_FILE")]
    pub lemmas: Option<PathBuf>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Only return passages with this section type
    #[arg(long, value_name = "TYPE")]
    pub section_type: Option<String>,

    /// Maximum number of passages to return
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Lexical weight in [0, 1]
    #[arg(short, long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f32,

    /// Keyword weights file (JSON object of token to weight in [1, 5])
    #[arg(long, value_name = "WEIGHTS_FILE")]
    pub weights: Option<PathBuf>,

    /// Append adjacent-token compounds found in the corpus (weighted mode)
    #[arg(long)]
    pub expand_compounds: bool,

    /// Print the joined passage context after the results
    #[arg(long)]
    pub context: bool,
}

/// Arguments for index statistics
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub index: IndexArgs,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Evaluation queries (JSONL with "query" and "positive_contexts")
    #[arg(value_name = "QUERIES")]
    pub queries: PathBuf,

    /// Cut-off for precision, recall and similarity
    #[arg(short = 'k', long, default_value_t = DEFAULT_EVAL_K)]
    pub k: usize,

    /// Lexical weight in [0, 1]
    #[arg(short, long, default_value_t = DEFAULT_EVAL_ALPHA)]
    pub alpha: f32,
}

/// Arguments for tokenization
#[derive(Parser, Debug, Clone)]
pub struct TokenizeArgs {
    /// Text to tokenize
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Fold regular plurals
    #[arg(long)]
    pub lemmatize: bool,

    /// Lemma table file (JSON object of form to lemma)
    #[arg(long, value_name = "LEMMAS_FILE")]
    pub lemmas: Option<PathBuf>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
