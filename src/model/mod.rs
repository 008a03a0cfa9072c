// File: ./src/model/mod.rs
pub mod event;
pub mod file;
pub mod plugin;

pub use event::{ContentAction, ContentChangeEvent};
pub use file::{FileEntry, OpenFile, SessionSnapshot};
pub use plugin::{ActivationIntent, PluginLaunchRequest, PluginManifest, PluginScript};
