use super::markup::normalize_whitespace;

/// Text layer of a PDF document
///
/// The PDF parser can panic on malformed input; that is contained here and
/// reported as empty text.
pub fn pdf_text(bytes: &[u8]) -> String {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => normalize_whitespace(&text),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "PDF text extraction failed");
            String::new()
        }
        Err(_) => {
            tracing::warn!("PDF parser panicked");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_empty() {
        assert_eq!(pdf_text(b"%PDF-1.4 truncated"), "");
        assert_eq!(pdf_text(b""), "");
    }
}
