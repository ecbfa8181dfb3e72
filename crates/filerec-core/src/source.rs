//! File sources: where item content comes from

use crate::error::{RecError, Result};
use crate::item::ItemId;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Media type used when nothing better can be guessed
pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A file whose content can be turned into an item
///
/// `id` must be stable and unique per file; scratch space for archive
/// extraction is derived from it.
pub trait FileSource: Send + Sync {
    fn id(&self) -> ItemId;

    fn media_type(&self) -> &str;

    fn read_bytes(&self) -> io::Result<Vec<u8>>;

    fn path(&self) -> &Path;

    fn owner_id(&self) -> &str;

    /// Size in bytes if known without reading the content
    fn size(&self) -> Option<u64> {
        None
    }

    /// Display name, the final path component by default
    fn name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

/// Deterministic 63-bit id derived from a path
///
/// The top bit is cleared so ids survive a round-trip through signed
/// 64-bit storage.
pub fn file_id(path: &Path) -> ItemId {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(prefix) & (i64::MAX as u64)
}

/// Media type guessed from the file extension
pub fn guess_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

/// A file on the local file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsFile {
    id: ItemId,
    path: PathBuf,
    media_type: String,
    owner_id: String,
}

impl FsFile {
    /// The id is taken from the canonical path when the file exists, so two
    /// spellings of the same path share an id
    pub fn new(path: impl Into<PathBuf>, owner_id: impl Into<String>) -> Self {
        let path = path.into();
        let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        FsFile {
            id: file_id(&canonical),
            media_type: guess_media_type(&path),
            path,
            owner_id: owner_id.into(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }
}

impl FileSource for FsFile {
    fn id(&self) -> ItemId {
        self.id
    }

    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }
}

/// Every regular file below `root`, sorted by path
///
/// Files directly under `root` belong to `default_owner`. A file in a
/// subdirectory belongs to the user named by the first path component, so
/// `root/alice/report.docx` is owned by `alice`. Hidden entries are skipped.
pub fn scan_dir(root: &Path, default_owner: &str) -> Result<Vec<FsFile>> {
    if !root.is_dir() {
        return Err(RecError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let owner = match relative.components().count() {
            0 | 1 => default_owner.to_string(),
            _ => relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .unwrap_or_else(|| default_owner.to_string()),
        };
        files.push(FsFile::new(entry.path(), owner));
    }

    tracing::debug!(root = %root.display(), files = files.len(), "Scanned file tree");
    Ok(files)
}
