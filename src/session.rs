// File: src/session.rs
//! Open-file state of one editing surface.
//!
//! `SessionStore` is the single source of truth for which files are open,
//! their tab order and their dirty flags. Every operation is total: unknown
//! paths are logged and ignored instead of reported, because change
//! notifications routinely race with a tab being closed.
use crate::model::{OpenFile, SessionSnapshot};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    files: Vec<OpenFile>,
    index: HashSet<PathBuf>,
    selected: Option<usize>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, path: &Path) -> Option<usize> {
        if !self.index.contains(path) {
            return None;
        }
        self.files.iter().position(|f| f.path == path)
    }

    /// Opens `path` unless it already is, and makes it the active tab.
    /// Returns the (possibly pre-existing) entry.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> &OpenFile {
        let path = path.into();
        let idx = match self.position(&path) {
            Some(idx) => idx,
            None => {
                self.index.insert(path.clone());
                self.files.push(OpenFile::new(path));
                self.files.len() - 1
            }
        };
        self.selected = Some(idx);
        &self.files[idx]
    }

    pub fn add_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.add_file(path);
        }
    }

    pub fn set_modified(&mut self, path: &Path, modified: bool) {
        match self.position(path) {
            Some(idx) => self.files[idx].modified = modified,
            None => log::debug!("set_modified ignored, {:?} is not open", path),
        }
    }

    pub fn remove_file(&mut self, path: &Path) -> Option<OpenFile> {
        let idx = self.position(path)?;
        self.index.remove(path);
        let removed = self.files.remove(idx);

        self.selected = match self.selected {
            _ if self.files.is_empty() => None,
            Some(sel) if sel > idx => Some(sel - 1),
            Some(sel) if sel == idx => Some(sel.min(self.files.len() - 1)),
            other => other,
        };
        Some(removed)
    }

    /// Re-keys an open file after it was renamed on disk. Tab position and
    /// dirty flag are preserved; renaming onto another open file is refused.
    pub fn rename_file(&mut self, old: &Path, new: impl Into<PathBuf>) -> bool {
        let new = new.into();
        let Some(idx) = self.position(old) else {
            return false;
        };
        if new == old {
            return true;
        }
        if self.index.contains(&new) {
            log::warn!("Cannot rename {:?}: {:?} is already open", old, new);
            return false;
        }
        self.index.remove(old);
        self.index.insert(new.clone());

        let modified = self.files[idx].modified;
        self.files[idx] = OpenFile {
            modified,
            ..OpenFile::new(new)
        };
        true
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.index.clear();
        self.selected = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(self.files.iter().map(|f| f.path.clone()).collect())
    }

    /// Replaces the whole session. Entries whose file vanished from disk
    /// are dropped.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.clear();
        for path in &snapshot.paths {
            if !path.exists() {
                log::info!("Skipping {:?} from last session: file no longer exists", path);
                continue;
            }
            self.add_file(path.clone());
        }
        // Restored sessions open on the first tab.
        self.selected = if self.files.is_empty() { None } else { Some(0) };
    }

    // --- Queries ---

    pub fn files(&self) -> &[OpenFile] {
        &self.files
    }

    pub fn get(&self, path: &Path) -> Option<&OpenFile> {
        self.position(path).map(|idx| &self.files[idx])
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains(path)
    }

    pub fn is_modified(&self, path: &Path) -> bool {
        self.get(path).is_some_and(|f| f.modified)
    }

    pub fn modified_files(&self) -> Vec<&OpenFile> {
        self.files.iter().filter(|f| f.modified).collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.files.iter().any(|f| f.modified)
    }

    /// Marks every open file clean, e.g. after "save all".
    pub fn mark_all_saved(&mut self) {
        for file in &mut self.files {
            file.modified = false;
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    // --- Active tab ---

    pub fn select(&mut self, path: &Path) -> bool {
        match self.position(path) {
            Some(idx) => {
                self.selected = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&OpenFile> {
        self.selected.and_then(|idx| self.files.get(idx))
    }
}
