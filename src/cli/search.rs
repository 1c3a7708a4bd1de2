//! Search and explain CLI commands.

use super::write_error;
use crate::models::{DEFAULT_TOP_K, RankedResult, SearchRequest};
use crate::{Error, Result, SurrealVectorStore, VectorStore};
use std::io::Write;

/// Longest content preview printed per result, in characters.
const PREVIEW_CHARS: usize = 80;

/// Search options shared by `search` and `explain`.
#[derive(Debug, Clone, clap::Args)]
pub struct SearchArgs {
    /// The search query.
    pub query: String,

    /// Maximum number of results.
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Minimum score (0.0 to 1.0) for a result to be returned.
    #[arg(short, long, default_value_t = 0.0)]
    pub threshold: f64,

    /// Metadata filter, e.g. "genre == 'drama' && year >= 2020".
    #[arg(short, long)]
    pub filter: Option<String>,
}

impl SearchArgs {
    /// Converts the options into a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the filter does not parse or the
    /// options are out of range.
    pub fn to_request(&self) -> Result<SearchRequest> {
        let mut request = SearchRequest::new(self.query.clone())
            .with_top_k(self.top_k)
            .with_similarity_threshold(self.threshold);
        if let Some(filter) = &self.filter {
            request = request.with_filter_text(filter)?;
        }
        request.validate()?;
        Ok(request)
    }
}

/// Result output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One ranked line per result with a content preview.
    #[default]
    Text,
    /// The results as a JSON array.
    Json,
}

/// Runs a similarity search and prints the results.
///
/// # Errors
///
/// Returns an error if the request is invalid or the search fails.
pub fn cmd_search(
    store: &SurrealVectorStore,
    args: &SearchArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<Vec<RankedResult>> {
    let request = args.to_request()?;
    let results = store.similarity_search(&request)?;

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &results)
                .map_err(|e| Error::ExecutionFailure {
                    operation: "write_output".to_string(),
                    cause: e.to_string(),
                })?;
            writeln!(out).map_err(write_error)?;
        },
        OutputFormat::Text if results.is_empty() => {
            writeln!(out, "No results").map_err(write_error)?;
        },
        OutputFormat::Text => {
            for (rank, result) in results.iter().enumerate() {
                writeln!(
                    out,
                    "{}. {} (score {:.4}, distance {:.4})\n   {}",
                    rank + 1,
                    result.id,
                    result.score,
                    result.distance,
                    preview(&result.content)
                )
                .map_err(write_error)?;
            }
        },
    }
    Ok(results)
}

/// Prints the statements a search would send, without executing them.
///
/// # Errors
///
/// Returns an error if the request is invalid, embedding fails, or the filter
/// cannot be compiled.
pub fn cmd_explain(
    store: &SurrealVectorStore,
    args: &SearchArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let query = store.build_search_query(&args.to_request()?)?;
    writeln!(out, "{query}").map_err(write_error)
}

fn preview(content: &str) -> String {
    let line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= PREVIEW_CHARS {
        line
    } else {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}
