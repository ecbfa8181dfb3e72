//! `filerec extract` - print the text read from one file

use std::path::Path;

use filerec_core::config::RecommenderConfig;
use filerec_core::error::{RecError, Result};
use filerec_core::extract::{ContentExtractor, DocumentFormat};
use filerec_core::source::{FileSource, FsFile};
use serde_json::json;

use crate::cli::{Cli, OutputFormat};

/// Resolve a file argument, overriding the guessed media type when given
pub(super) fn open_file(path: &Path, media_type: Option<&str>) -> Result<FsFile> {
    if !path.is_file() {
        return Err(RecError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = FsFile::new(path, "");
    Ok(match media_type {
        Some(media_type) => file.with_media_type(media_type),
        None => file,
    })
}

/// Execute the extract command
pub fn execute(
    cli: &Cli,
    config: &RecommenderConfig,
    path: &Path,
    media_type: Option<&str>,
) -> Result<()> {
    let file = open_file(path, media_type)?;
    let format = DocumentFormat::from_media_type(file.media_type());
    let text = ContentExtractor::new(config.extraction.clone()).extract_file(&file);

    match cli.format {
        OutputFormat::Human => {
            if text.is_empty() && !cli.quiet {
                eprintln!("No text extracted from {} ({})", path.display(), file.media_type());
            }
            println!("{}", text);
        }
        OutputFormat::Json => {
            let output = json!({
                "path": path.display().to_string(),
                "id": file.id(),
                "media_type": file.media_type(),
                "format": format.as_str(),
                "text": text,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
