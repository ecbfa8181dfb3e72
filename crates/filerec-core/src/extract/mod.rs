//! Content extraction: media type to plain text
//!
//! Dispatch is a pure mapping from the declared media type to one reader.
//! Readers never fail: an unreadable file, an unknown type, a malformed
//! document, an oversized file or a reader that overruns its time budget all
//! produce empty text.

mod doc;
mod markup;
mod office;
mod pdf;
mod rtf;
mod scratch;

pub use markup::{html_to_text, json_to_text, xml_to_text};
pub use rtf::{rtf_to_html, rtf_to_text};
pub use scratch::ScratchDir;

use crate::config::ExtractionConfig;
use crate::item::ItemId;
use crate::source::FileSource;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

/// Document formats with a text reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Html,
    Json,
    Xml,
    Pdf,
    Doc,
    Docx,
    Pptx,
    Xlsx,
    Ods,
    Odt,
    Rtf,
    Unsupported,
}

impl DocumentFormat {
    /// Map a declared media type; parameters such as `charset` are ignored
    pub fn from_media_type(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" | "text/markdown" | "text/x-markdown" | "text/csv" => {
                DocumentFormat::PlainText
            }
            "text/html" | "application/xhtml+xml" => DocumentFormat::Html,
            "application/json" => DocumentFormat::Json,
            "application/xml" | "text/xml" => DocumentFormat::Xml,
            "application/pdf" => DocumentFormat::Pdf,
            "application/msword" => DocumentFormat::Doc,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                DocumentFormat::Docx
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                DocumentFormat::Pptx
            }
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                DocumentFormat::Xlsx
            }
            "application/vnd.oasis.opendocument.spreadsheet" => DocumentFormat::Ods,
            "application/vnd.oasis.opendocument.text" => DocumentFormat::Odt,
            "application/rtf" | "text/rtf" => DocumentFormat::Rtf,
            _ => DocumentFormat::Unsupported,
        }
    }

    pub fn is_supported(self) -> bool {
        self != DocumentFormat::Unsupported
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "plain_text",
            DocumentFormat::Html => "html",
            DocumentFormat::Json => "json",
            DocumentFormat::Xml => "xml",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Ods => "ods",
            DocumentFormat::Odt => "odt",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run the reader for `format` on in-memory content
pub fn extract_format(
    format: DocumentFormat,
    file_id: ItemId,
    bytes: &[u8],
    config: &ExtractionConfig,
) -> String {
    match format {
        DocumentFormat::PlainText => String::from_utf8_lossy(bytes).into_owned(),
        DocumentFormat::Html => html_to_text(&String::from_utf8_lossy(bytes)),
        DocumentFormat::Json => json_to_text(bytes),
        DocumentFormat::Xml => xml_to_text(&String::from_utf8_lossy(bytes)),
        DocumentFormat::Pdf => pdf::pdf_text(bytes),
        DocumentFormat::Doc => doc::doc_text(bytes, file_id, config),
        DocumentFormat::Docx => office::docx_text(bytes, file_id, config),
        DocumentFormat::Pptx => office::pptx_text(bytes, file_id, config),
        DocumentFormat::Xlsx => office::xlsx_text(bytes, file_id, config),
        DocumentFormat::Ods | DocumentFormat::Odt => {
            office::opendocument_text(bytes, file_id, config)
        }
        DocumentFormat::Rtf => rtf_to_text(&String::from_utf8_lossy(bytes)),
        DocumentFormat::Unsupported => String::new(),
    }
}

/// Extracts text from file sources within size and time limits
///
/// Clones share the worker count and the timeout counter.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    config: ExtractionConfig,
    workers: Arc<AtomicUsize>,
    timed_out: Arc<AtomicUsize>,
}

/// A running reader thread; dropped when the thread ends, panics included
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        ContentExtractor {
            config,
            ..ContentExtractor::default()
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extractions abandoned after the timeout so far
    pub fn timed_out(&self) -> usize {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Reader threads still running, including abandoned ones
    pub fn running_workers(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    /// Text of in-memory content declared as `media_type`, without a timeout
    pub fn extract(&self, file_id: ItemId, bytes: &[u8], media_type: &str) -> String {
        let format = DocumentFormat::from_media_type(media_type);
        if !format.is_supported() {
            tracing::debug!(file_id, media_type, "No reader for media type");
            return String::new();
        }
        extract_format(format, file_id, bytes, &self.config)
    }

    /// Text of a file source
    ///
    /// The reader runs on its own thread; when it panics or does not finish
    /// within the configured timeout the file contributes empty text. A
    /// reader that times out is left to finish in the background and its
    /// output is discarded. At most `max_workers` readers run at once; while
    /// abandoned readers hold every slot, files are skipped.
    pub fn extract_file(&self, file: &dyn FileSource) -> String {
        let file_id = file.id();
        let format = DocumentFormat::from_media_type(file.media_type());
        if !format.is_supported() {
            tracing::debug!(file_id, media_type = file.media_type(), "No reader for media type");
            return String::new();
        }

        if let Some(size) = file.size() {
            if size > self.config.max_file_bytes {
                tracing::warn!(
                    file_id,
                    size,
                    limit = self.config.max_file_bytes,
                    "File exceeds size limit"
                );
                return String::new();
            }
        }

        let bytes = match file.read_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file_id, path = %file.path().display(), error = %e, "Failed to read file");
                return String::new();
            }
        };
        if bytes.len() as u64 > self.config.max_file_bytes {
            tracing::warn!(file_id, size = bytes.len(), "File exceeds size limit");
            return String::new();
        }

        let config = self.config.clone();
        self.run_with_timeout(file_id, format, move || {
            extract_format(format, file_id, &bytes, &config)
        })
    }

    fn acquire_worker(&self) -> Option<WorkerSlot> {
        let max = self.config.max_workers;
        self.workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| WorkerSlot(Arc::clone(&self.workers)))
    }

    fn run_with_timeout<F>(&self, file_id: ItemId, format: DocumentFormat, read: F) -> String
    where
        F: FnOnce() -> String + Send + 'static,
    {
        let Some(slot) = self.acquire_worker() else {
            tracing::warn!(
                file_id,
                %format,
                max_workers = self.config.max_workers,
                "Extraction workers are all stalled; skipping file"
            );
            return String::new();
        };

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("extract-{file_id:x}"))
            .spawn(move || {
                let text = read();
                // free the slot before the caller can see the result
                drop(slot);
                // receiver is gone after a timeout
                let _ = tx.send(text);
            });
        if let Err(e) = spawned {
            tracing::warn!(file_id, error = %e, "Failed to start extraction worker");
            return String::new();
        }

        match rx.recv_timeout(self.config.timeout()) {
            Ok(text) => {
                tracing::trace!(file_id, %format, chars = text.len(), "Extracted text");
                text
            }
            Err(RecvTimeoutError::Timeout) => {
                self.timed_out.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(
                    file_id,
                    %format,
                    timeout_secs = self.config.timeout_secs,
                    running = self.running_workers(),
                    "Extraction timed out"
                );
                String::new()
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!(file_id, %format, "Extraction worker failed");
                String::new()
            }
        }
    }
}
