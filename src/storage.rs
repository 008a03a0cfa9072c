// Durable storage for the last editing session, plus the shared file-safety
// helpers (locking, atomic writes) used by every on-disk format.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to the layout of `SessionFileData` require incrementing
// SESSION_FILE_VERSION below.
use crate::context::AppContext;
use crate::model::SessionSnapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// --- Android Specific Imports ---
#[cfg(target_os = "android")]
use std::collections::HashMap;
#[cfg(target_os = "android")]
use std::sync::{Arc, Mutex, OnceLock};

// --- Desktop Specific Imports ---
#[cfg(not(target_os = "android"))]
use fs2::FileExt;

// Version history:
// - v0: bare JSON array of path strings (written by older app builds)
// - v1: wrapper object with version and save timestamp
const SESSION_FILE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SessionFileData {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    files: Vec<PathBuf>,
}

// --- Android Global Lock Map ---
#[cfg(target_os = "android")]
static ANDROID_FILE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

pub struct LocalStorage;

impl LocalStorage {
    #[cfg(not(target_os = "android"))]
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    // --- DESKTOP IMPLEMENTATION (fs2) ---
    #[cfg(not(target_os = "android"))]
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    // --- ANDROID IMPLEMENTATION (In-Memory Mutex) ---
    // Scoped storage on some devices refuses flock(), and only this process
    // ever touches the app-private files.
    #[cfg(target_os = "android")]
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let map_mutex = ANDROID_FILE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));

        let key = file_path.canonicalize().unwrap_or(file_path.to_path_buf());

        let file_mutex = {
            let mut map = map_mutex
                .lock()
                .map_err(|_| anyhow::anyhow!("File lock map poisoned"))?;
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _guard = file_mutex
            .lock()
            .map_err(|_| anyhow::anyhow!("File lock poisoned for {:?}", file_path))?;

        f()
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

/// The `lastOpenedFile.json` record.
pub struct SessionStorage;

impl SessionStorage {
    pub fn get_path(ctx: &dyn AppContext) -> Option<PathBuf> {
        ctx.get_last_opened_files_path()
    }

    fn parse(json: &str) -> Result<SessionSnapshot> {
        if let Ok(data) = serde_json::from_str::<SessionFileData>(json) {
            if data.version > SESSION_FILE_VERSION {
                log::warn!(
                    "Session file version {} is newer than supported v{}",
                    data.version,
                    SESSION_FILE_VERSION
                );
            }
            return Ok(SessionSnapshot::new(data.files));
        }

        let files: Vec<PathBuf> =
            serde_json::from_str(json).context("Session file is neither v1 nor a path array")?;
        log::info!("Read legacy session file with {} entries", files.len());
        Ok(SessionSnapshot::new(files))
    }

    /// Reads the last snapshot. A missing file is an empty session.
    pub fn load(ctx: &dyn AppContext) -> Result<SessionSnapshot> {
        let path = Self::get_path(ctx)
            .ok_or_else(|| anyhow::anyhow!("Could not determine session file path"))?;
        if !path.exists() {
            return Ok(SessionSnapshot::default());
        }
        LocalStorage::with_lock(&path, || {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file {:?}", path))?;
            Self::parse(&json)
        })
    }

    /// Never fails: any read or parse problem yields an empty session.
    pub fn load_or_empty(ctx: &dyn AppContext) -> SessionSnapshot {
        Self::load(ctx).unwrap_or_else(|e| {
            log::warn!("Starting with an empty session: {:#}", e);
            SessionSnapshot::default()
        })
    }

    pub fn save(ctx: &dyn AppContext, snapshot: &SessionSnapshot) -> Result<()> {
        let path = Self::get_path(ctx)
            .ok_or_else(|| anyhow::anyhow!("Could not determine session file path"))?;
        LocalStorage::with_lock(&path, || {
            let data = SessionFileData {
                version: SESSION_FILE_VERSION,
                saved_at: Some(Utc::now()),
                files: snapshot.paths.clone(),
            };
            let json = serde_json::to_string_pretty(&data)?;
            LocalStorage::atomic_write(&path, json)?;
            Ok(())
        })
    }

    pub fn clear(ctx: &dyn AppContext) -> Result<()> {
        Self::save(ctx, &SessionSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_file_is_empty_session() {
        let ctx = TestContext::new();
        assert!(SessionStorage::load(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_order() {
        let ctx = TestContext::new();
        let snapshot = SessionSnapshot::new(vec![
            PathBuf::from("/b/second.rs"),
            PathBuf::from("/a/first.rs"),
        ]);
        SessionStorage::save(&ctx, &snapshot).unwrap();

        assert_eq!(SessionStorage::load(&ctx).unwrap(), snapshot);

        let raw = fs::read_to_string(SessionStorage::get_path(&ctx).unwrap()).unwrap();
        assert!(raw.contains("\"version\": 1"));
        assert!(raw.contains("saved_at"));
    }

    #[test]
    fn test_legacy_array_format() {
        let ctx = TestContext::new();
        let path = SessionStorage::get_path(&ctx).unwrap();
        fs::write(&path, r#"["/sdcard/a.txt", "/sdcard/b.txt"]"#).unwrap();

        let snapshot = SessionStorage::load(&ctx).unwrap();
        assert_eq!(
            snapshot.paths,
            vec![PathBuf::from("/sdcard/a.txt"), PathBuf::from("/sdcard/b.txt")]
        );
    }

    #[test]
    fn test_corrupt_file_yields_empty_session() {
        let ctx = TestContext::new();
        let path = SessionStorage::get_path(&ctx).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(SessionStorage::load(&ctx).is_err());
        assert!(SessionStorage::load_or_empty(&ctx).is_empty());
    }

    #[test]
    fn test_atomic_write_leaves_no_tmp() {
        let ctx = TestContext::new();
        let target = ctx.root.join("out.json");
        LocalStorage::atomic_write(&target, "[]").unwrap();
        assert!(target.exists());
        assert!(!target.with_extension("tmp").exists());
    }

    #[test]
    fn test_clear() {
        let ctx = TestContext::new();
        SessionStorage::save(&ctx, &SessionSnapshot::new(vec![PathBuf::from("/x")])).unwrap();
        SessionStorage::clear(&ctx).unwrap();
        assert!(SessionStorage::load(&ctx).unwrap().is_empty());
    }
}
