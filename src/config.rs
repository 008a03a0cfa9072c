// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use strum::EnumIter;

fn default_true() -> bool {
    true
}

fn default_text_size() -> u32 {
    14
}

fn default_tab_size() -> u32 {
    4
}

fn default_font() -> String {
    "firacode".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
pub enum AppTheme {
    #[default]
    FollowSystem,
    Light,
    Dark,
}

impl fmt::Display for AppTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppTheme::FollowSystem => write!(f, "Follow system"),
            AppTheme::Light => write!(f, "Light"),
            AppTheme::Dark => write!(f, "Dark"),
        }
    }
}

/// Persisted preferences.
///
/// The session core only reads `show_hidden_files` and `plugins_path`. The
/// remaining fields are owned by the host's settings screens and are kept
/// here so that every UI layer reads the same file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    // General
    #[serde(default)]
    pub theme: AppTheme,
    #[serde(default = "default_true")]
    pub dynamic_colors: bool,

    // Editor
    #[serde(default = "default_text_size")]
    pub text_size: u32,
    #[serde(default = "default_tab_size")]
    pub tab_size: u32,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_true")]
    pub sticky_scroll: bool,
    #[serde(default = "default_true")]
    pub font_ligatures: bool,
    #[serde(default)]
    pub word_wrap: bool,
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    #[serde(default)]
    pub use_tab: bool,
    #[serde(default = "default_true")]
    pub delete_empty_line_fast: bool,
    #[serde(default = "default_true")]
    pub delete_tabs: bool,
    #[serde(default)]
    pub auto_save: bool,

    // File
    #[serde(default)]
    pub show_hidden_files: bool,
    /// Overrides `<data>/plugins` when set.
    #[serde(default)]
    pub plugins_path: Option<PathBuf>,

    // Git
    #[serde(default)]
    pub credential_username: Option<String>,
    #[serde(default)]
    pub credential_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: AppTheme::default(),
            dynamic_colors: true,
            // Match the serde defaults
            text_size: 14,
            tab_size: 4,
            font: default_font(),
            sticky_scroll: true,
            font_ligatures: true,
            word_wrap: false,
            line_numbers: true,
            use_tab: false,
            delete_empty_line_fast: true,
            delete_tabs: true,
            auto_save: false,
            show_hidden_files: false,
            plugins_path: None,
            credential_username: None,
            credential_password: None,
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but never fails: a missing file is silent, a
    /// broken one is logged, and defaults are returned either way.
    pub fn load_or_default(ctx: &dyn AppContext) -> Self {
        match Self::load(ctx) {
            Ok(config) => config,
            Err(e) => {
                if !Self::is_missing_config_error(&e) {
                    log::warn!("Using default settings: {:#}", e);
                }
                Self::default()
            }
        }
    }

    /// Detects whether an error means the config file was missing, either via
    /// our explicit message or an `io::ErrorKind::NotFound` anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Root directory holding one sub-directory per installed plugin.
    pub fn plugins_root(&self, ctx: &dyn AppContext) -> Option<PathBuf> {
        self.plugins_path
            .clone()
            .or_else(|| ctx.get_default_plugins_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_config_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx), Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "show_hidden_files = true\ntab_size = 2\n").unwrap();

        let config = Config::load(&ctx).unwrap();
        assert!(config.show_hidden_files);
        assert_eq!(config.tab_size, 2);
        assert_eq!(config.text_size, 14);
        assert!(config.line_numbers);
        assert_eq!(config.plugins_path, None);
    }

    #[test]
    fn test_save_then_load() {
        let ctx = TestContext::new();
        let config = Config {
            theme: AppTheme::Dark,
            word_wrap: true,
            plugins_path: Some(PathBuf::from("/sdcard/plugins")),
            ..Config::default()
        };
        config.save(&ctx).unwrap();

        assert_eq!(Config::load(&ctx).unwrap(), config);
    }

    #[test]
    fn test_broken_config_falls_back() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "tab_size = \"wide\"").unwrap();

        let err = Config::load(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).tab_size, 4);
    }

    #[test]
    fn test_every_theme_survives_toml() {
        use strum::IntoEnumIterator;
        let ctx = TestContext::new();
        for theme in AppTheme::iter() {
            let config = Config {
                theme,
                ..Config::default()
            };
            config.save(&ctx).unwrap();
            assert_eq!(Config::load(&ctx).unwrap().theme, theme, "{}", theme);
        }
    }

    #[test]
    fn test_plugins_root_override() {
        let ctx = TestContext::new();
        let mut config = Config::default();
        assert_eq!(
            config.plugins_root(&ctx),
            Some(ctx.root.join("data").join("plugins"))
        );

        config.plugins_path = Some(PathBuf::from("/plugins"));
        assert_eq!(config.plugins_root(&ctx), Some(PathBuf::from("/plugins")));
    }
}
