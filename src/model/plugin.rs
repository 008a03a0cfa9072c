// Plugin manifests and the activation intents that open an editor.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginScript {
    pub name: String,
}

/// `manifest.json` at the root of a plugin directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    #[serde(default)]
    pub name: String,
    pub package_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scripts: Vec<PluginScript>,
}

impl PluginManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugin manifest {:?}", path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse plugin manifest {:?}", path))
    }

    /// Reads every `<root>/<dir>/manifest.json`, sorted by package name.
    /// Directories without a readable manifest are skipped.
    pub fn list_installed(plugins_root: &Path) -> Vec<Self> {
        let Ok(entries) = fs::read_dir(plugins_root) else {
            return vec![];
        };

        let mut manifests: Vec<Self> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let path = e.path().join(MANIFEST_FILE_NAME);
                match Self::load(&path) {
                    Ok(m) => Some(m),
                    Err(err) => {
                        log::warn!("Skipping plugin at {:?}: {:#}", e.path(), err);
                        None
                    }
                }
            })
            .collect();
        manifests.sort_by(|a, b| a.package_name.cmp(&b.package_name));
        manifests
    }
}

/// What the plugin listing hands to the editor when "edit plugin" is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLaunchRequest {
    pub package_name: String,
    pub scripts: Vec<PluginScript>,
}

impl PluginLaunchRequest {
    pub fn new(package_name: impl Into<String>, script_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            scripts: vec![PluginScript {
                name: script_name.into(),
            }],
        }
    }

    pub fn plugin_dir(&self, plugins_root: &Path) -> PathBuf {
        plugins_root.join(&self.package_name)
    }

    /// The manifest followed by the first declared script. A plugin without
    /// scripts only opens its manifest.
    pub fn files_to_open(&self, plugins_root: &Path) -> Vec<PathBuf> {
        let dir = self.plugin_dir(plugins_root);
        let mut files = vec![dir.join(MANIFEST_FILE_NAME)];
        if let Some(script) = self.scripts.first() {
            files.push(dir.join(&script.name));
        }
        files
    }
}

impl From<&PluginManifest> for PluginLaunchRequest {
    fn from(manifest: &PluginManifest) -> Self {
        Self {
            package_name: manifest.package_name.clone(),
            scripts: manifest.scripts.clone(),
        }
    }
}

/// Inbound request that seeds a freshly created editor. Resolved once, on
/// the Created transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActivationIntent {
    Plugin(PluginLaunchRequest),
    /// A URI-like locator (`file:///...`) or a plain absolute path.
    ExternalFile(String),
    #[default]
    None,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_files_to_open() {
        let req = PluginLaunchRequest::new("demo", "main.js");
        assert_eq!(
            req.files_to_open(Path::new("/plugins")),
            vec![
                PathBuf::from("/plugins/demo/manifest.json"),
                PathBuf::from("/plugins/demo/main.js"),
            ]
        );
    }

    #[test]
    fn test_files_to_open_without_scripts() {
        let req = PluginLaunchRequest {
            package_name: "empty".to_string(),
            scripts: vec![],
        };
        assert_eq!(
            req.files_to_open(Path::new("/plugins")),
            vec![PathBuf::from("/plugins/empty/manifest.json")]
        );
    }

    #[test]
    fn test_manifest_parsing_and_listing() {
        let ctx = TestContext::new();
        let root = ctx.root.join("plugins");

        fs::create_dir_all(root.join("zeta")).unwrap();
        fs::write(
            root.join("zeta").join(MANIFEST_FILE_NAME),
            r#"{"name":"Zeta","packageName":"zeta","version":"1.0","scripts":[{"name":"main.js"},{"name":"util.js"}]}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("alpha")).unwrap();
        fs::write(
            root.join("alpha").join(MANIFEST_FILE_NAME),
            r#"{"packageName":"alpha"}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("broken")).unwrap();
        fs::write(root.join("broken").join(MANIFEST_FILE_NAME), "{").unwrap();
        fs::create_dir_all(root.join("no_manifest")).unwrap();

        let installed = PluginManifest::list_installed(&root);
        let names: Vec<&str> = installed.iter().map(|m| m.package_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let req = PluginLaunchRequest::from(&installed[1]);
        assert_eq!(req.scripts.len(), 2);
        assert_eq!(req.files_to_open(&root)[1], root.join("zeta").join("main.js"));
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        assert!(PluginManifest::list_installed(Path::new("/definitely/not/here")).is_empty());
    }
}
