//! Command implementations for the lorekeeper CLI.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::analysis::keywords::KeywordWeights;
use crate::analysis::lemma::{LemmaTable, Lemmatizer, LemmatizingTokenizer, PluralLemmatizer};
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::embedding::embedder::Embedder;
use crate::embedding::hashed::HashedEmbedder;
use crate::error::Result;
use crate::eval::{Evaluator, load_eval_queries};
use crate::hybrid::config::RetrieverConfig;
use crate::hybrid::types::SearchRequest;
use crate::lexical::scoring::LexicalScoring;
use crate::passage::jsonl::load_passages;
use crate::passage::source::SourceFilter;
use crate::retriever::Retriever;
use crate::retriever::status::BuildReport;

/// Execute a CLI command.
pub fn execute_command(args: LorekeeperArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => search(search_args, &args),
        Command::Status(status_args) => status(status_args, &args),
        Command::Eval(eval_args) => eval(eval_args, &args),
        Command::Tokenize(tokenize_args) => tokenize(tokenize_args, &args),
    }
}

/// The lexical tokenizer selected by the lemmatization flags.
fn build_tokenizer(lemmatize: bool, lemmas: Option<&Path>) -> Result<Arc<dyn Tokenizer>> {
    let base: Arc<dyn Tokenizer> = Arc::new(RegexTokenizer::default());
    let lemmatizer: Option<Arc<dyn Lemmatizer>> = match (lemmas, lemmatize) {
        (Some(path), true) => Some(Arc::new(
            LemmaTable::from_json_file(path)?.with_fallback(Arc::new(PluralLemmatizer)),
        )),
        (Some(path), false) => Some(Arc::new(LemmaTable::from_json_file(path)?)),
        (None, true) => Some(Arc::new(PluralLemmatizer)),
        (None, false) => None,
    };

    Ok(match lemmatizer {
        Some(lemmatizer) => Arc::new(LemmatizingTokenizer::new(base, lemmatizer)),
        None => base,
    })
}

/// Load passages and build a retriever over them.
fn build_retriever(args: &IndexArgs) -> Result<(Retriever, BuildReport)> {
    let config = match &args.config {
        Some(path) => RetrieverConfig::from_json_file(path)?,
        None => RetrieverConfig::default(),
    };

    let filter = match &args.source {
        Some(source) => SourceFilter::source(source.clone()),
        None => SourceFilter::all(),
    };
    let passages = load_passages(&args.passages, &filter)?;
    info!(
        path = %args.passages.display(),
        passages = passages.len(),
        "loaded passages"
    );

    let tokenizer = build_tokenizer(args.lemmatize, args.lemmas.as_deref())?;
    let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new(args.dimension)?);
    let retriever = Retriever::with_config(config)?.with_tokenizer(tokenizer);
    let report = retriever.initialize(passages, embedder)?;
    Ok((retriever, report))
}

/// Read a keyword weights file.
fn load_weights(path: &Path) -> Result<KeywordWeights> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Build indexes and run one query.
fn search(args: &SearchArgs, cli_args: &LorekeeperArgs) -> Result<()> {
    let (retriever, _) = build_retriever(&args.index)?;

    let scoring = match &args.weights {
        Some(path) => LexicalScoring::Weighted {
            weights: load_weights(path)?,
            expand_compounds: args.expand_compounds,
        },
        None if args.expand_compounds => LexicalScoring::Weighted {
            weights: KeywordWeights::new(),
            expand_compounds: true,
        },
        None => LexicalScoring::Joint,
    };

    let mut request = SearchRequest::new(args.query.clone())
        .top_k(args.top_k)
        .alpha(args.alpha)
        .scoring(scoring);
    if let Some(section_type) = &args.section_type {
        request = request.section_type(section_type.clone());
    }

    let results = retriever.search_with(&request)?;
    let context = args.context.then(|| results.context());

    output_result(
        "Search completed",
        &SearchOutput { results, context },
        cli_args,
    )
}

/// Build indexes and report their statistics.
fn status(args: &StatusArgs, cli_args: &LorekeeperArgs) -> Result<()> {
    let (retriever, build) = build_retriever(&args.index)?;

    output_result(
        "Retriever status",
        &StatusOutput {
            status: retriever.status(),
            build,
            source: args.index.source.clone(),
        },
        cli_args,
    )
}

/// Build indexes and score queries against their ground-truth passages.
fn eval(args: &EvalArgs, cli_args: &LorekeeperArgs) -> Result<()> {
    let evaluator = Evaluator::new(args.k, args.alpha)?;
    let (retriever, _) = build_retriever(&args.index)?;

    let queries = load_eval_queries(&args.queries)?;
    info!(
        path = %args.queries.display(),
        queries = queries.len(),
        "loaded evaluation queries"
    );
    let report = evaluator.evaluate(&retriever, &queries)?;

    output_result("Evaluation completed", &EvalOutput { report }, cli_args)
}

/// Tokenize text the way the lexical index does.
fn tokenize(args: &TokenizeArgs, cli_args: &LorekeeperArgs) -> Result<()> {
    let tokenizer = build_tokenizer(args.lemmatize, args.lemmas.as_deref())?;
    let tokens = tokenizer.tokenize(&args.text);

    output_result(
        "Tokens",
        &TokenizeOutput {
            text: args.text.clone(),
            tokens,
        },
        cli_args,
    )
}
