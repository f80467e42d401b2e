//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{LorekeeperArgs, OutputFormat};
use crate::error::Result;
use crate::eval::EvalReport;
use crate::hybrid::types::SearchResults;
use crate::retriever::status::{BuildReport, RetrieverStatus};

/// Result of the `search` command.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    #[serde(flatten)]
    pub results: SearchResults,
    /// Joined passage texts, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Result of the `status` command.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub status: RetrieverStatus,
    pub build: BuildReport,
    pub source: Option<String>,
}

/// Result of the `eval` command.
#[derive(Debug, Serialize)]
pub struct EvalOutput {
    #[serde(flatten)]
    pub report: EvalReport,
}

/// Result of the `tokenize` command.
#[derive(Debug, Serialize)]
pub struct TokenizeOutput {
    pub text: String,
    pub tokens: Vec<String>,
}

/// Rendering for the human output format.
pub trait HumanReadable {
    /// Print to stdout at the given verbosity.
    fn print_human(&self, verbosity: u8);
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &LorekeeperArgs) -> Result<()>
where
    T: Serialize + HumanReadable,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human(args.verbosity());
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &LorekeeperArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

impl HumanReadable for SearchOutput {
    fn print_human(&self, verbosity: u8) {
        let results = &self.results;
        if results.is_empty() {
            println!("No passages matched \"{}\".", results.query);
        }

        for (rank, hit) in results.results.iter().enumerate() {
            println!(
                "{}. [{}] {} (score: {:.4})",
                rank + 1,
                hit.passage.section_type,
                hit.passage.id,
                hit.score
            );
            if verbosity > 1 {
                let raw_vector = hit
                    .raw_vector_score
                    .map(|s| format!("{s:.4}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "   lexical: {:.4} (raw {:.4})  vector: {:.4} (raw {})",
                    hit.lexical_score, hit.raw_lexical_score, hit.vector_score, raw_vector
                );
            }
            if verbosity > 0 {
                println!("   {}", hit.passage.text);
            }
        }

        if verbosity > 0 {
            println!();
            println!(
                "{} of {} passages ({} candidates, {} re-ranked, {} scoring) in {:.2}ms",
                results.len(),
                results.passages_searched,
                results.candidate_count,
                results.reranked_count,
                results.scoring,
                results.elapsed_ms
            );
        }

        if let Some(context) = &self.context {
            println!();
            println!("{context}");
        }
    }
}

impl HumanReadable for StatusOutput {
    fn print_human(&self, verbosity: u8) {
        let status = &self.status;
        println!("Initialized: {}", status.initialized);
        println!("Passages: {}", status.passage_count);
        if let Some(source) = &self.source {
            println!("Source: {source}");
        }
        println!("Vocabulary: {}", status.vocabulary_size);
        println!("Average passage length: {:.1} tokens", status.avg_passage_len);
        if let (Some(dimension), Some(embedder)) = (status.dimension, &status.embedder) {
            println!("Embedder: {embedder} ({dimension} dimensions)");
        }
        if let Some(tokenizer) = &status.tokenizer {
            println!("Tokenizer: {tokenizer}");
        }
        if verbosity > 1 {
            if let Some(id) = status.snapshot_id {
                println!("Snapshot: {id}");
            }
            if let Some(built_at) = status.built_at {
                println!("Built at: {}", built_at.to_rfc3339());
            }
            println!(
                "Build: {:.2}ms total ({:.2}ms lexical, {:.2}ms vector, {} embed batches)",
                self.build.total_ms, self.build.lexical_ms, self.build.vector_ms, self.build.embed_batches
            );
        }
    }
}

impl HumanReadable for EvalOutput {
    fn print_human(&self, verbosity: u8) {
        let report = &self.report;
        let k = report.k;

        for evaluation in &report.queries {
            if verbosity > 0 {
                println!("Query: {}", evaluation.query);
                println!("  Ground truth: {}", evaluation.relevant_ids.join(", "));
                println!("  Retrieved: {}", evaluation.retrieved_ids.join(", "));
            }
            let similarity = match evaluation.semantic_similarity {
                Some(s) => format!("{s:.4}"),
                None => "-".to_string(),
            };
            println!(
                "  Precision@{k}: {:.4}  Recall@{k}: {:.4}  Similarity@{k}: {similarity}",
                evaluation.precision, evaluation.recall
            );
            if verbosity > 1 {
                match evaluation.is_semantically_relevant() {
                    Some(true) => println!("  Context is semantically relevant."),
                    Some(false) => println!("  Context may be off-topic."),
                    None => println!("  No ground-truth passage is indexed."),
                }
            }
        }

        let mean_similarity = match report.mean_semantic_similarity {
            Some(s) => format!("{s:.4}"),
            None => "-".to_string(),
        };
        println!();
        println!(
            "{} queries, alpha {}: mean Precision@{k} {:.4}, Recall@{k} {:.4}, Similarity@{k} {mean_similarity}",
            report.queries.len(),
            report.alpha,
            report.mean_precision,
            report.mean_recall
        );
        if verbosity > 1 {
            println!("Snapshot {} in {:.2}ms", report.snapshot_id, report.elapsed_ms);
        }
    }
}

impl HumanReadable for TokenizeOutput {
    fn print_human(&self, _verbosity: u8) {
        println!("{}", self.tokens.join(" "));
    }
}
