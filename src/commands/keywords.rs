//! `filerec keywords` - TF-IDF keywords of one file against a corpus

use std::path::Path;

use filerec_core::config::RecommenderConfig;
use filerec_core::error::Result;
use filerec_core::extract::ContentExtractor;
use filerec_core::source::{scan_dir, FileSource};
use filerec_core::text::tokenize_with;
use filerec_core::tfidf::{TermBag, TfIdfEngine};
use serde_json::json;

use super::extract::open_file;
use crate::cli::{Cli, OutputFormat};

fn term_bag(extractor: &ContentExtractor, config: &RecommenderConfig, file: &dyn FileSource) -> TermBag {
    let text = extractor.extract_file(file);
    TermBag::from_tokens(file.id(), tokenize_with(&text, &config.tokenizer))
}

/// Execute the keywords command
///
/// Without a corpus directory the file is scored against itself, which
/// gives every term an IDF of zero.
pub fn execute(
    cli: &Cli,
    config: &RecommenderConfig,
    path: &Path,
    corpus_dir: Option<&Path>,
    limit: usize,
) -> Result<()> {
    let extractor = ContentExtractor::new(config.extraction.clone());
    let target = open_file(path, None)?;
    let document = term_bag(&extractor, config, &target);

    let mut corpus = Vec::new();
    if let Some(dir) = corpus_dir {
        for file in scan_dir(dir, "")? {
            if file.id() != target.id() {
                corpus.push(term_bag(&extractor, config, &file));
            }
        }
    }
    corpus.push(document.clone());
    tracing::debug!(documents = corpus.len(), "Built keyword corpus");

    let mut keywords = TfIdfEngine::new().compute(&document, &corpus);
    keywords.truncate(limit);

    match cli.format {
        OutputFormat::Human => {
            if keywords.is_empty() && !cli.quiet {
                eprintln!("No keywords for {}", path.display());
            }
            for keyword in &keywords {
                println!("{:<24} {:>8.4} {:>5}", keyword.word, keyword.score, keyword.count);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "path": path.display().to_string(),
                "id": target.id(),
                "documents": corpus.len(),
                "keywords": keywords,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
