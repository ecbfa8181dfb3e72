//! Legacy Word (.doc) documents
//!
//! The binary format is not parsed. Text is recovered heuristically from
//! runs of printable characters, stored either as 8-bit text or as UTF-16LE.
//! Files that are really OOXML packages are handed to the DOCX reader.

use super::markup::normalize_whitespace;
use super::office::docx_text;
use crate::config::ExtractionConfig;
use crate::item::ItemId;

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const MIN_RUN: usize = 4;

pub fn doc_text(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> String {
    if bytes.starts_with(&ZIP_MAGIC) {
        return docx_text(bytes, file_id, config);
    }
    if !bytes.starts_with(&OLE_MAGIC) {
        tracing::debug!(file_id, "Not an OLE compound document");
        return String::new();
    }

    let wide = utf16_runs(bytes);
    let narrow = ascii_runs(bytes);
    // word stores the body in one encoding or the other; keep the richer one
    let runs = if wide.iter().map(String::len).sum::<usize>()
        >= narrow.iter().map(String::len).sum::<usize>()
    {
        wide
    } else {
        narrow
    };
    normalize_whitespace(&runs.join(" "))
}

fn is_text_char(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\n' || (!c.is_control() && c != '\u{FFFD}')
}

fn push_run(runs: &mut Vec<String>, run: &mut String) {
    if run.trim().chars().count() >= MIN_RUN && run.chars().any(char::is_alphabetic) {
        runs.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

fn ascii_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut run = String::new();
    for &b in bytes {
        let c = char::from(b);
        if b.is_ascii() && is_text_char(c) {
            run.push(c);
        } else {
            push_run(&mut runs, &mut run);
        }
    }
    push_run(&mut runs, &mut run);
    runs
}

fn utf16_runs(bytes: &[u8]) -> Vec<String> {
    let mut runs = Vec::new();
    let mut run = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        match char::from_u32(u32::from(unit)) {
            // latin and general punctuation only; anything else is binary noise
            Some(c) if unit < 0x0250 && is_text_char(c) => run.push(c),
            Some(c) if (0x2010..0x2030).contains(&unit) => run.push(c),
            _ => push_run(&mut runs, &mut run),
        }
    }
    push_run(&mut runs, &mut run);
    runs
}
