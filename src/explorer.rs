// File: ./src/explorer.rs
// Browse state of the file drawer: the active directory and its listing.
use crate::model::FileEntry;
use crate::model::file::display_name;
use anyhow::{Context, Result, bail};
use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Extensions the editor refuses to open as text.
const BINARY_EXTENSIONS: &[&str] = &[
    "bin", "ttf", "png", "jpg", "jpeg", "bmp", "mp4", "mp3", "m4a", "iso", "so", "zip", "jar",
    "dex", "odex", "vdex", "7z", "apk", "apks", "xapk",
];

pub fn is_valid_text_file(file_name: &str) -> bool {
    match Path::new(file_name).extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            !BINARY_EXTENSIONS.contains(&ext.as_str())
        }
        None => true,
    }
}

/// Directories first, then case-insensitive by name.
pub fn compare_entries(a: &FileEntry, b: &FileEntry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

pub fn list_dir(dir: &Path, show_hidden: bool) -> Result<Vec<FileEntry>> {
    let read = fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))?;

    let mut entries: Vec<FileEntry> = read
        .flatten()
        .map(|e| {
            let path = e.path();
            FileEntry {
                name: display_name(&path),
                is_dir: path.is_dir(),
                path,
            }
        })
        .filter(|e| show_hidden || !e.is_hidden())
        .collect();
    entries.sort_by(compare_entries);
    Ok(entries)
}

fn child_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Invalid file name {:?}", name);
    }
    Ok(dir.join(name))
}

/// Creates an empty file `name` inside `dir`. Refuses an existing entry.
pub fn create_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = child_path(dir, name)?;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("Failed to create file {:?}", path))?;
    Ok(path)
}

pub fn create_folder(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = child_path(dir, name)?;
    fs::create_dir(&path).with_context(|| format!("Failed to create folder {:?}", path))?;
    Ok(path)
}

/// Renames `path` in place to `new_name`. Returns the new path.
pub fn rename_entry(path: &Path, new_name: &str) -> Result<PathBuf> {
    let parent = path
        .parent()
        .with_context(|| format!("Cannot rename {:?}", path))?;
    let target = child_path(parent, new_name)?;
    if target == path {
        return Ok(target);
    }
    if target.exists() {
        bail!("{:?} already exists", target);
    }
    fs::rename(path, &target)
        .with_context(|| format!("Failed to rename {:?} to {:?}", path, target))?;
    Ok(target)
}

/// Deletes a file, or a directory with everything below it. Symlinks are
/// removed, not followed.
pub fn delete_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("Cannot delete {:?}", path))?;
    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.with_context(|| format!("Failed to delete {:?}", path))
}

#[derive(Debug, Clone, Default)]
pub struct FileExplorer {
    current_path: Option<PathBuf>,
    entries: Vec<FileEntry>,
}

impl FileExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the explorer at `path`. A file path browses its parent
    /// directory. Listing errors leave an empty listing.
    pub fn set_current_path(&mut self, path: &Path, show_hidden: bool) {
        let dir = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        self.current_path = Some(dir.to_path_buf());
        self.refresh(show_hidden);
    }

    pub fn refresh(&mut self, show_hidden: bool) {
        let Some(dir) = &self.current_path else {
            return;
        };
        self.entries = list_dir(dir, show_hidden).unwrap_or_else(|e| {
            log::warn!("{:#}", e);
            vec![]
        });
    }

    /// Moves to the parent directory. Returns false at the filesystem root.
    pub fn go_up(&mut self, show_hidden: bool) -> bool {
        let Some(parent) = self
            .current_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
        else {
            return false;
        };
        self.set_current_path(&parent, show_hidden);
        true
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }
}
