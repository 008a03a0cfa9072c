// Files as the editor session sees them.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file open in an editing session. The path is the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub path: PathBuf,
    pub modified: bool,
    pub name: String,
}

impl OpenFile {
    pub fn new(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self {
            path,
            modified: false,
            name,
        }
    }
}

/// Durable, ordering-only view of a session. Modification state is never
/// part of a snapshot, so restored sessions start clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub paths: Vec<PathBuf>,
}

impl SessionSnapshot {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A single row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl FileEntry {
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(OpenFile::new(PathBuf::from("/a/b/main.rs")).name, "main.rs");
        assert_eq!(OpenFile::new(PathBuf::from("/")).name, "/");
    }

    #[test]
    fn test_new_file_is_clean() {
        assert!(!OpenFile::new(PathBuf::from("/x.txt")).modified);
    }
}
