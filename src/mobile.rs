/* vcspace/src/mobile.rs
 *
 * UniFFI interface exposing the editor session core to the Android host.
 */

use crate::config::{AppTheme, Config};
use crate::context::{AppContext, StandardContext};
use crate::events::ContentEventBus;
use crate::explorer::is_valid_text_file;
use crate::lifecycle::LifecycleEvent;
use crate::model::{
    ActivationIntent, ContentAction, ContentChangeEvent, PluginLaunchRequest, PluginManifest,
    PluginScript,
};
use crate::router::EditorRouter;
use crate::writer::SnapshotWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    Generic(String),
}
impl From<String> for MobileError {
    fn from(e: String) -> Self {
        Self::Generic(e)
    }
}
impl From<&str> for MobileError {
    fn from(e: &str) -> Self {
        Self::Generic(e.to_string())
    }
}
impl From<anyhow::Error> for MobileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Generic(format!("{:#}", e))
    }
}
impl std::fmt::Display for MobileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MobileError::Generic(s) => s,
            }
        )
    }
}
impl std::error::Error for MobileError {}

#[derive(uniffi::Enum)]
pub enum MobileLifecycleEvent {
    OnCreate,
    OnStart,
    OnResume,
    OnPause,
    OnStop,
    OnDestroy,
    OnAny,
}

impl From<MobileLifecycleEvent> for LifecycleEvent {
    fn from(e: MobileLifecycleEvent) -> Self {
        match e {
            MobileLifecycleEvent::OnCreate => LifecycleEvent::Create,
            MobileLifecycleEvent::OnStart => LifecycleEvent::Start,
            MobileLifecycleEvent::OnResume => LifecycleEvent::Resume,
            MobileLifecycleEvent::OnPause => LifecycleEvent::Pause,
            MobileLifecycleEvent::OnStop => LifecycleEvent::Stop,
            MobileLifecycleEvent::OnDestroy => LifecycleEvent::Destroy,
            MobileLifecycleEvent::OnAny => LifecycleEvent::Any,
        }
    }
}

#[derive(uniffi::Enum)]
pub enum MobileContentAction {
    Insert,
    Delete,
    SetNewText,
}

impl From<MobileContentAction> for ContentAction {
    fn from(a: MobileContentAction) -> Self {
        match a {
            MobileContentAction::Insert => ContentAction::Insert,
            MobileContentAction::Delete => ContentAction::Delete,
            MobileContentAction::SetNewText => ContentAction::SetNewText,
        }
    }
}

#[derive(uniffi::Record)]
pub struct MobileOpenFile {
    pub path: String,
    pub name: String,
    pub is_modified: bool,
    pub is_selected: bool,
}

#[derive(uniffi::Record)]
pub struct MobileFileEntry {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub is_text: bool,
}

#[derive(uniffi::Record)]
pub struct MobilePlugin {
    pub name: String,
    pub package_name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub scripts: Vec<String>,
}

#[derive(uniffi::Record)]
pub struct MobileConfig {
    pub theme: String,
    pub dynamic_colors: bool,
    pub text_size: u32,
    pub tab_size: u32,
    pub font: String,
    pub sticky_scroll: bool,
    pub font_ligatures: bool,
    pub word_wrap: bool,
    pub line_numbers: bool,
    pub use_tab: bool,
    pub delete_empty_line_fast: bool,
    pub delete_tabs: bool,
    pub auto_save: bool,
    pub show_hidden_files: bool,
    pub plugins_path: Option<String>,
}

fn theme_from_name(name: &str) -> AppTheme {
    use strum::IntoEnumIterator;
    AppTheme::iter()
        .find(|t| t.to_string() == name)
        .unwrap_or_default()
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn plugin_to_mobile(m: PluginManifest) -> MobilePlugin {
    MobilePlugin {
        name: m.name,
        package_name: m.package_name,
        version: m.version,
        author: m.author,
        description: m.description,
        scripts: m.scripts.into_iter().map(|s| s.name).collect(),
    }
}

#[derive(uniffi::Object)]
pub struct VcspaceMobile {
    ctx: Arc<dyn AppContext>,
    bus: Arc<ContentEventBus>,
    writer: SnapshotWriter,
    router: Mutex<EditorRouter>,
    /// Runs the snapshot writer; kept alive for the object's lifetime.
    _runtime: tokio::runtime::Runtime,
}

impl VcspaceMobile {
    fn router(&self) -> MutexGuard<'_, EditorRouter> {
        self.router.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl VcspaceMobile {
    #[uniffi::constructor]
    pub fn new(android_files_dir: String) -> Result<Self, MobileError> {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("VCSpaceRust"),
        );

        let ctx: Arc<dyn AppContext> =
            Arc::new(StandardContext::new(Some(PathBuf::from(android_files_dir))));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("vcspace-writer")
            .enable_all()
            .build()
            .map_err(|e| MobileError::from(format!("Failed to start writer runtime: {}", e)))?;

        let bus = Arc::new(ContentEventBus::new());
        let writer = SnapshotWriter::spawn_on(runtime.handle(), ctx.clone());
        let router = EditorRouter::new(ctx.clone(), bus.clone(), Arc::new(writer.clone()));

        Ok(Self {
            ctx,
            bus,
            writer,
            router: Mutex::new(router),
            _runtime: runtime,
        })
    }

    // --- Lifecycle ---

    pub fn on_lifecycle_event(&self, event: MobileLifecycleEvent) {
        self.router().on_lifecycle_event(event.into());
    }

    /// Called before `OnCreate` when the editor is opened from the plugin list.
    pub fn set_plugin_intent(&self, package_name: String, script_names: Vec<String>) {
        let request = PluginLaunchRequest {
            package_name,
            scripts: script_names
                .into_iter()
                .map(|name| PluginScript { name })
                .collect(),
        };
        self.router()
            .set_launch_intent(ActivationIntent::Plugin(request));
    }

    /// Called before `OnCreate` when another app shared a file with the editor.
    pub fn set_external_file_intent(&self, locator: String) {
        self.router()
            .set_launch_intent(ActivationIntent::ExternalFile(locator));
    }

    /// Waits until the last queued session snapshot is on disk.
    pub async fn flush_session(&self) {
        self.writer.flush().await;
    }

    // --- Content changes ---

    /// Safe to call from the editor's own thread; the change is applied on
    /// the next `process_notifications` or lifecycle callback.
    pub fn publish_content_change(&self, path: Option<String>, action: MobileContentAction) -> u32 {
        let event = ContentChangeEvent {
            file: path.map(PathBuf::from),
            action: action.into(),
        };
        self.bus.publish(event) as u32
    }

    pub fn process_notifications(&self) -> u32 {
        self.router().process_notifications() as u32
    }

    // --- Open files ---

    pub fn open_file(&self, path: String) {
        self.router().open_file(path);
    }

    pub fn close_file(&self, path: String) {
        self.router().close_file(Path::new(&path));
    }

    pub fn close_all(&self) {
        self.router().close_all();
    }

    pub fn select_file(&self, path: String) -> bool {
        self.router().store_mut().select(Path::new(&path))
    }

    pub fn file_renamed(&self, old_path: String, new_path: String) {
        self.router()
            .file_renamed(Path::new(&old_path), Path::new(&new_path));
    }

    pub fn mark_all_saved(&self) {
        self.router().store_mut().mark_all_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        let mut router = self.router();
        router.process_notifications();
        router.store().has_unsaved_changes()
    }

    pub fn get_open_files(&self) -> Vec<MobileOpenFile> {
        let mut router = self.router();
        router.process_notifications();
        let store = router.store();
        let selected = store.selected().map(|f| f.path.clone());
        store
            .files()
            .iter()
            .map(|f| MobileOpenFile {
                path: path_string(&f.path),
                name: f.name.clone(),
                is_modified: f.modified,
                is_selected: selected.as_ref() == Some(&f.path),
            })
            .collect()
    }

    // --- Explorer ---

    pub fn browse(&self, path: String) {
        self.router().browse(Path::new(&path));
    }

    pub fn go_up(&self) -> bool {
        let show_hidden = Config::load_or_default(self.ctx.as_ref()).show_hidden_files;
        self.router().explorer_mut().go_up(show_hidden)
    }

    pub fn refresh_directory(&self) {
        let show_hidden = Config::load_or_default(self.ctx.as_ref()).show_hidden_files;
        self.router().explorer_mut().refresh(show_hidden);
    }

    pub fn get_current_path(&self) -> Option<String> {
        self.router().explorer().current_path().map(path_string)
    }

    pub fn get_directory_entries(&self) -> Vec<MobileFileEntry> {
        self.router()
            .explorer()
            .entries()
            .iter()
            .map(|e| MobileFileEntry {
                path: path_string(&e.path),
                name: e.name.clone(),
                is_dir: e.is_dir,
                is_text: !e.is_dir && is_valid_text_file(&e.name),
            })
            .collect()
    }

    // --- File management ---

    pub fn create_file(&self, dir: String, name: String) -> Result<String, MobileError> {
        let path = self.router().create_file(Path::new(&dir), &name)?;
        Ok(path_string(&path))
    }

    pub fn create_folder(&self, dir: String, name: String) -> Result<String, MobileError> {
        let path = self.router().create_folder(Path::new(&dir), &name)?;
        Ok(path_string(&path))
    }

    pub fn rename_entry(&self, path: String, new_name: String) -> Result<String, MobileError> {
        let target = self.router().rename(Path::new(&path), &new_name)?;
        Ok(path_string(&target))
    }

    pub fn delete_entry(&self, path: String) -> Result<(), MobileError> {
        self.router().delete(Path::new(&path))?;
        Ok(())
    }

    // --- Plugins ---

    pub fn list_plugins(&self) -> Vec<MobilePlugin> {
        let config = Config::load_or_default(self.ctx.as_ref());
        let Some(root) = config.plugins_root(self.ctx.as_ref()) else {
            return vec![];
        };
        PluginManifest::list_installed(&root)
            .into_iter()
            .map(plugin_to_mobile)
            .collect()
    }

    // --- Settings ---

    pub fn get_config(&self) -> MobileConfig {
        let c = Config::load_or_default(self.ctx.as_ref());
        MobileConfig {
            theme: c.theme.to_string(),
            dynamic_colors: c.dynamic_colors,
            text_size: c.text_size,
            tab_size: c.tab_size,
            font: c.font,
            sticky_scroll: c.sticky_scroll,
            font_ligatures: c.font_ligatures,
            word_wrap: c.word_wrap,
            line_numbers: c.line_numbers,
            use_tab: c.use_tab,
            delete_empty_line_fast: c.delete_empty_line_fast,
            delete_tabs: c.delete_tabs,
            auto_save: c.auto_save,
            show_hidden_files: c.show_hidden_files,
            plugins_path: c.plugins_path.as_deref().map(path_string),
        }
    }

    pub fn save_config(&self, config: MobileConfig) -> Result<(), MobileError> {
        // Start from disk so fields the host does not manage (git credentials) survive.
        let mut c = Config::load_or_default(self.ctx.as_ref());
        c.theme = theme_from_name(&config.theme);
        c.dynamic_colors = config.dynamic_colors;
        c.text_size = config.text_size;
        c.tab_size = config.tab_size;
        c.font = config.font;
        c.sticky_scroll = config.sticky_scroll;
        c.font_ligatures = config.font_ligatures;
        c.word_wrap = config.word_wrap;
        c.line_numbers = config.line_numbers;
        c.use_tab = config.use_tab;
        c.delete_empty_line_fast = config.delete_empty_line_fast;
        c.delete_tabs = config.delete_tabs;
        c.auto_save = config.auto_save;
        c.show_hidden_files = config.show_hidden_files;
        c.plugins_path = config.plugins_path.map(PathBuf::from);
        c.save(self.ctx.as_ref())?;
        Ok(())
    }
}
