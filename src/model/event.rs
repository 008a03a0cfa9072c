// Content-change notifications published by the editing surface.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentAction {
    Insert,
    Delete,
    /// The whole buffer was replaced (initial load, reload from disk).
    SetNewText,
}

impl ContentAction {
    /// Whether a change of this kind leaves the buffer out of sync with disk.
    pub fn marks_modified(self) -> bool {
        !matches!(self, ContentAction::SetNewText)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChangeEvent {
    pub file: Option<PathBuf>,
    pub action: ContentAction,
}

impl ContentChangeEvent {
    pub fn new(file: impl Into<PathBuf>, action: ContentAction) -> Self {
        Self {
            file: Some(file.into()),
            action,
        }
    }

    /// An event whose editor has no file attached (scratch buffer).
    pub fn detached(action: ContentAction) -> Self {
        Self { file: None, action }
    }
}
