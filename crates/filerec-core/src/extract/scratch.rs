use crate::item::ItemId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Per-extraction scratch directory, removed on drop
///
/// The directory name starts with the file id and carries the process id
/// and a per-process sequence number, so two extractions never share one.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path, file_id: ItemId) -> io::Result<Self> {
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let path = root.join(format!(
            "{file_id:016x}-{}-{sequence}",
            std::process::id()
        ));
        fs::create_dir_all(&path)?;
        Ok(ScratchDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch directory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_removed_on_drop() {
        let root = tempdir().unwrap();
        let path = {
            let scratch = ScratchDir::create(root.path(), 42).unwrap();
            fs::write(scratch.path().join("inner.xml"), "<x/>").unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_keyed_by_file_id_and_unique() {
        let root = tempdir().unwrap();
        let a = ScratchDir::create(root.path(), 7).unwrap();
        let b = ScratchDir::create(root.path(), 7).unwrap();
        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("0000000000000007-"));
    }
}
