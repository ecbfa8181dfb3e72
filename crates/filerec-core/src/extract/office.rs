//! Zip-packaged office documents: OOXML and OpenDocument
//!
//! Each archive is unpacked into its own [`ScratchDir`] and the inner XML
//! parts are read back from disk. Any failure along the way (unreadable
//! archive, oversized archive, missing part, malformed XML) yields empty
//! text.

use super::markup::{normalize_whitespace, xml_text};
use super::scratch::ScratchDir;
use crate::config::ExtractionConfig;
use crate::item::ItemId;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const DOCX_BREAKS: &[&[u8]] = &[b"w:p", b"w:tab", b"w:br", b"w:cr"];
const PPTX_BREAKS: &[&[u8]] = &[b"a:p", b"a:br", b"p:sp"];
const OPENDOCUMENT_BREAKS: &[&[u8]] = &[
    b"text:p",
    b"text:h",
    b"text:s",
    b"text:tab",
    b"text:line-break",
    b"table:table-cell",
];

/// Unpack `bytes` into a fresh scratch directory
///
/// The directory is removed again when the returned guard drops, including
/// on every early return here.
fn unpack(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> Option<ScratchDir> {
    let scratch = match ScratchDir::create(&config.scratch_root(), file_id) {
        Ok(scratch) => scratch,
        Err(e) => {
            tracing::warn!(file_id, error = %e, "Failed to create scratch directory");
            return None;
        }
    };

    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::debug!(file_id, error = %e, "Not a readable archive");
            return None;
        }
    };

    let declared: u64 = (0..archive.len())
        .filter_map(|i| archive.by_index_raw(i).ok().map(|entry| entry.size()))
        .sum();
    if declared > config.max_archive_entry_bytes {
        tracing::warn!(
            file_id,
            declared,
            limit = config.max_archive_entry_bytes,
            "Archive exceeds unpacked size limit"
        );
        return None;
    }

    match unpack_entries(&mut archive, scratch.path(), config.max_archive_entry_bytes) {
        Ok(true) => Some(scratch),
        Ok(false) => {
            tracing::warn!(
                file_id,
                limit = config.max_archive_entry_bytes,
                "Archive unpacks past its declared size limit"
            );
            None
        }
        Err(e) => {
            tracing::debug!(file_id, error = %e, "Failed to unpack archive");
            None
        }
    }
}

/// Write every entry below `dest`, reading at most `limit` bytes in total
///
/// Declared sizes are not trusted here. Returns `Ok(false)` as soon as the
/// decompressed output would pass `limit`.
fn unpack_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
    limit: u64,
) -> io::Result<bool> {
    let mut remaining = limit;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(io::Error::other)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = fs::File::create(&target)?;
        let written = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)?;
        if written > remaining {
            return Ok(false);
        }
        remaining -= written;
    }
    Ok(true)
}

fn read_part(dir: &Path, part: &str) -> Option<String> {
    fs::read_to_string(dir.join(part)).ok()
}

/// Files named `<prefix><N>.xml` directly under `dir`, ordered by N
fn numbered_parts(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut parts: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = name
                .to_str()?
                .strip_prefix(prefix)?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, entry.path()))
        })
        .collect();
    parts.sort_by_key(|(number, _)| *number);
    parts.into_iter().map(|(_, path)| path).collect()
}

fn join_parts(texts: impl IntoIterator<Item = String>) -> String {
    let joined: Vec<String> = texts.into_iter().filter(|t| !t.is_empty()).collect();
    joined.join(" ")
}

/// Text of `word/document.xml`
pub fn docx_text(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> String {
    let Some(scratch) = unpack(bytes, file_id, config) else {
        return String::new();
    };
    read_part(scratch.path(), "word/document.xml")
        .and_then(|xml| xml_text(&xml, DOCX_BREAKS))
        .unwrap_or_default()
}

/// Text of every `ppt/slides/slide<N>.xml` in slide order, one space
/// between shapes
pub fn pptx_text(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> String {
    let Some(scratch) = unpack(bytes, file_id, config) else {
        return String::new();
    };
    let slides = numbered_parts(&scratch.path().join("ppt/slides"), "slide");
    join_parts(slides.iter().filter_map(|slide| {
        let xml = fs::read_to_string(slide).ok()?;
        xml_text(&xml, PPTX_BREAKS)
    }))
}

/// Cell text of every `xl/worksheets/sheet<N>.xml` in ascending N
///
/// Shared-string cells are resolved against `xl/sharedStrings.xml`.
pub fn xlsx_text(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> String {
    let Some(scratch) = unpack(bytes, file_id, config) else {
        return String::new();
    };
    let shared = read_part(scratch.path(), "xl/sharedStrings.xml")
        .and_then(|xml| shared_strings(&xml))
        .unwrap_or_default();
    let sheets = numbered_parts(&scratch.path().join("xl/worksheets"), "sheet");
    join_parts(sheets.iter().filter_map(|sheet| {
        let xml = fs::read_to_string(sheet).ok()?;
        sheet_text(&xml, &shared)
    }))
}

/// Text of `content.xml` (ODS spreadsheets and ODT documents)
pub fn opendocument_text(bytes: &[u8], file_id: ItemId, config: &ExtractionConfig) -> String {
    let Some(scratch) = unpack(bytes, file_id, config) else {
        return String::new();
    };
    read_part(scratch.path(), "content.xml")
        .and_then(|xml| xml_text(&xml, OPENDOCUMENT_BREAKS))
        .unwrap_or_default()
}

fn shared_strings(xml: &str) -> Option<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(e)) if in_text => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed shared strings");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }
    Some(strings)
}

fn sheet_text(xml: &str, shared: &[String]) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut cells = Vec::new();
    let mut shared_cell = false;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"c" => {
                    shared_cell = e
                        .try_get_attribute("t")
                        .ok()
                        .flatten()
                        .is_some_and(|attr| attr.value.as_ref() == b"s");
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"c" => shared_cell = false,
                b"v" | b"t" => in_value = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_value => {
                let text = e.unescape().unwrap_or_default();
                if shared_cell {
                    let resolved = text
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| shared.get(index));
                    if let Some(value) = resolved {
                        cells.push(value.clone());
                    }
                } else {
                    cells.push(text.into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Malformed worksheet");
                return None;
            }
            _ => {}
        }
        buf.clear();
    }
    Some(normalize_whitespace(&cells.join(" ")))
}
