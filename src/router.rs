// File: src/router.rs
//! Lifecycle event router for one editor surface.
//!
//! The router owns the session store and the explorer state. It turns host
//! lifecycle callbacks into the effects computed by [`crate::lifecycle`] and
//! applies queued content-change notifications to the store. All mutation
//! happens on whichever context owns the router; the bus only queues.
use crate::config::Config;
use crate::context::AppContext;
use crate::events::{ContentEventBus, Subscription};
use crate::explorer::{self, FileExplorer};
use crate::lifecycle::{self, Effect, LifecycleEvent, LifecycleState};
use crate::model::{ActivationIntent, ContentChangeEvent};
use crate::session::SessionStore;
use crate::storage::SessionStorage;
use crate::writer::SnapshotSink;
use std::path::{Path, PathBuf};
use anyhow::Result;
use std::sync::Arc;
use url::Url;

/// Turns an inbound file locator into a local absolute path.
///
/// Accepts `file://` URIs (percent-decoded) and plain absolute paths. Other
/// schemes, such as Android `content://` URIs, cannot be resolved here.
pub fn resolve_locator(locator: &str) -> Option<PathBuf> {
    if let Ok(url) = Url::parse(locator)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }
    let path = Path::new(locator);
    path.is_absolute().then(|| path.to_path_buf())
}

pub struct EditorRouter {
    ctx: Arc<dyn AppContext>,
    bus: Arc<ContentEventBus>,
    sink: Arc<dyn SnapshotSink>,
    state: LifecycleState,
    subscription: Option<Subscription>,
    pending_intent: ActivationIntent,
    store: SessionStore,
    explorer: FileExplorer,
}

impl EditorRouter {
    pub fn new(
        ctx: Arc<dyn AppContext>,
        bus: Arc<ContentEventBus>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            ctx,
            bus,
            sink,
            state: LifecycleState::Idle,
            subscription: None,
            pending_intent: ActivationIntent::None,
            store: SessionStore::new(),
            explorer: FileExplorer::new(),
        }
    }

    /// Intent consumed by the next Created transition.
    pub fn set_launch_intent(&mut self, intent: ActivationIntent) {
        self.pending_intent = intent;
    }

    pub fn on_lifecycle_event(&mut self, event: LifecycleEvent) {
        // Anything published before this callback is applied first.
        self.process_notifications();

        let (next, effects) = lifecycle::transition(self.state, event);
        if next != self.state {
            log::debug!("Editor lifecycle {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;

        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::RestoreSession => {
                // A queued write may not have reached the session file yet.
                let snapshot = self
                    .sink
                    .latest()
                    .unwrap_or_else(|| SessionStorage::load_or_empty(self.ctx.as_ref()));
                self.store.restore(&snapshot);
                log::info!(
                    "Restored {} of {} files from last session",
                    self.store.len(),
                    snapshot.paths.len()
                );
            }
            Effect::Subscribe => {
                if self.subscription.is_none() {
                    self.subscription = Some(self.bus.register());
                }
            }
            Effect::Activate => self.activate(),
            Effect::PersistSnapshot => self.sink.persist(self.store.snapshot()),
            Effect::Unsubscribe => {
                if let Some(subscription) = self.subscription.take() {
                    self.bus.unregister(subscription);
                }
            }
        }
    }

    fn activate(&mut self) {
        let intent = std::mem::take(&mut self.pending_intent);
        if intent == ActivationIntent::None {
            return;
        }
        let config = Config::load_or_default(self.ctx.as_ref());

        match intent {
            ActivationIntent::Plugin(request) => {
                let Some(root) = config.plugins_root(self.ctx.as_ref()) else {
                    log::warn!("No plugins directory, cannot open {}", request.package_name);
                    return;
                };
                self.store.add_files(request.files_to_open(&root));
                self.explorer
                    .set_current_path(&request.plugin_dir(&root), config.show_hidden_files);
            }
            ActivationIntent::ExternalFile(locator) => {
                let Some(path) = resolve_locator(&locator) else {
                    log::warn!("Cannot resolve external file {:?}", locator);
                    return;
                };
                self.store.add_file(path.clone());
                if let Some(dir) = path.parent() {
                    self.explorer.set_current_path(dir, config.show_hidden_files);
                }
            }
            ActivationIntent::None => {}
        }
    }

    /// Applies every queued notification. Returns how many were handled.
    pub fn process_notifications(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(event) = subscription.try_recv() {
                pending.push(event);
            }
        }
        let count = pending.len();
        for event in pending {
            self.handle_notification(event);
        }
        count
    }

    pub fn handle_notification(&mut self, event: ContentChangeEvent) {
        match event.file {
            Some(path) => self.store.set_modified(&path, event.action.marks_modified()),
            None => log::debug!("Ignoring {:?} without a file", event.action),
        }
    }

    // --- User actions ---

    pub fn open_file(&mut self, path: impl Into<PathBuf>) {
        self.store.add_file(path);
    }

    pub fn close_file(&mut self, path: &Path) {
        self.store.remove_file(path);
    }

    pub fn close_all(&mut self) {
        self.store.clear();
    }

    /// Updates the session after the explorer renamed a file on disk.
    pub fn file_renamed(&mut self, old: &Path, new: &Path) {
        self.store.rename_file(old, new);
    }

    pub fn browse(&mut self, dir: &Path) {
        self.explorer.set_current_path(dir, self.show_hidden());
    }

    // --- File management ---

    pub fn create_file(&mut self, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = explorer::create_file(dir, name)?;
        self.refresh_explorer();
        Ok(path)
    }

    pub fn create_folder(&mut self, dir: &Path, name: &str) -> Result<PathBuf> {
        let path = explorer::create_folder(dir, name)?;
        self.refresh_explorer();
        Ok(path)
    }

    /// Renames a file or folder on disk and re-keys every open tab under it.
    pub fn rename(&mut self, path: &Path, new_name: &str) -> Result<PathBuf> {
        let target = explorer::rename_entry(path, new_name)?;
        for old in self.open_paths_under(path) {
            let rest = old.strip_prefix(path).unwrap_or(Path::new(""));
            let new = if rest.as_os_str().is_empty() {
                target.clone()
            } else {
                target.join(rest)
            };
            self.store.rename_file(&old, new);
        }
        self.refresh_explorer();
        Ok(target)
    }

    /// Deletes a file or folder from disk and closes every tab under it.
    pub fn delete(&mut self, path: &Path) -> Result<()> {
        explorer::delete_entry(path)?;
        for open in self.open_paths_under(path) {
            self.store.remove_file(&open);
        }
        self.refresh_explorer();
        Ok(())
    }

    fn open_paths_under(&self, path: &Path) -> Vec<PathBuf> {
        self.store
            .files()
            .iter()
            .filter(|f| f.path.starts_with(path))
            .map(|f| f.path.clone())
            .collect()
    }

    fn show_hidden(&self) -> bool {
        Config::load_or_default(self.ctx.as_ref()).show_hidden_files
    }

    fn refresh_explorer(&mut self) {
        let show_hidden = self.show_hidden();
        self.explorer.refresh(show_hidden);
    }

    // --- Accessors ---

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    pub fn explorer(&self) -> &FileExplorer {
        &self.explorer
    }

    pub fn explorer_mut(&mut self) -> &mut FileExplorer {
        &mut self.explorer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_file_uri() {
        assert_eq!(
            resolve_locator("file:///sdcard/My%20Docs/a.txt"),
            Some(PathBuf::from("/sdcard/My Docs/a.txt"))
        );
    }

    #[test]
    fn test_resolve_plain_path() {
        assert_eq!(
            resolve_locator("/storage/emulated/0/x.js"),
            Some(PathBuf::from("/storage/emulated/0/x.js"))
        );
    }

    #[test]
    fn test_unresolvable_locators() {
        assert_eq!(
            resolve_locator("content://com.android.providers/document/42"),
            None
        );
        assert_eq!(resolve_locator("relative/path.txt"), None);
    }
}
