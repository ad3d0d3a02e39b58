//! Launcher configuration file.
//!
//! `config.json` lists the prompt libraries to merge and where user edits go.
//! Missing keys fall back to defaults and keys this crate does not use (window
//! size, hot-key timing, clipboard behavior) are carried through untouched so
//! the desktop front-end can keep its settings in the same file. Relative
//! paths are resolved against the directory holding the config file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::catalog::{DEFAULT_LIBRARY_PATH, DEFAULT_USER_LIBRARY_PATH, Source};
use crate::store::CatalogStore;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PROMPTDECK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_MAX_RESULTS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Read-only libraries, merged in this order.
    #[serde(default = "default_library_paths")]
    pub library_paths: Vec<PathBuf>,
    /// The user's own library, merged after `library_paths`.
    #[serde(default = "default_user_library")]
    pub user_library: PathBuf,
    /// Target for edits; defaults to `user_library`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writable_source: Option<PathBuf>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_library_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_LIBRARY_PATH)]
}

fn default_user_library() -> PathBuf {
    PathBuf::from(DEFAULT_USER_LIBRARY_PATH)
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            library_paths: default_library_paths(),
            user_library: default_user_library(),
            writable_source: None,
            max_results: default_max_results(),
            extra: Map::new(),
            base_dir: PathBuf::new(),
        }
    }
}

/// Pick the config file: explicit flag, then `PROMPTDECK_CONFIG`, then
/// `config.json` in the working directory.
pub fn resolve_config_path(cli_override: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_override {
        return path.to_path_buf();
    }
    match env::var_os(CONFIG_ENV) {
        Some(raw) if !raw.is_empty() => PathBuf::from(raw),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

impl LauncherConfig {
    /// Read the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<LauncherConfig>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => LauncherConfig::default(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut body =
            serde_json::to_string_pretty(self).context("serializing launcher config")?;
        body.push('\n');
        fs::write(path, body).with_context(|| format!("writing config {}", path.display()))
    }

    /// Resolve a config-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Sources in merge order: libraries first, then the user library.
    pub fn sources(&self) -> Vec<Source> {
        self.library_paths
            .iter()
            .map(|path| Source::library(self.resolve(path)))
            .chain(std::iter::once(Source::user(self.resolve(&self.user_library))))
            .collect()
    }

    pub fn writable_source(&self) -> Option<PathBuf> {
        self.writable_source.as_deref().map(|path| self.resolve(path))
    }

    /// Remember an imported library; returns false if it was already listed.
    pub fn add_library(&mut self, path: PathBuf) -> bool {
        let resolved = self.resolve(&path);
        if self
            .library_paths
            .iter()
            .any(|existing| self.resolve(existing) == resolved)
        {
            return false;
        }
        self.library_paths.push(path);
        true
    }

    /// Load every configured source into a ready-to-use store.
    pub fn open_store(&self) -> CatalogStore {
        CatalogStore::open(self.sources(), self.writable_source().as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = LauncherConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
        let sources = config.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].location, dir.path().join(DEFAULT_LIBRARY_PATH));
        assert_eq!(sources[1].location, dir.path().join(DEFAULT_USER_LIBRARY_PATH));
        assert_eq!(config.writable_source(), None);
    }

    #[test]
    fn partial_file_merges_over_defaults_and_keeps_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            json!({"max_results": 3, "double_tap_threshold": 0.25, "auto_paste": false})
                .to_string(),
        )
        .unwrap();

        let config = LauncherConfig::load(&path).unwrap();
        assert_eq!(config.max_results, 3);
        assert_eq!(config.library_paths, default_library_paths());
        config.save(&path).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["double_tap_threshold"], 0.25);
        assert_eq!(saved["auto_paste"], false);
        assert_eq!(saved["max_results"], 3);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(LauncherConfig::load(&path).is_err());
    }

    #[test]
    fn add_library_is_idempotent() {
        let mut config = LauncherConfig::default();
        assert!(config.add_library(PathBuf::from("/srv/team.json")));
        assert!(!config.add_library(PathBuf::from("/srv/team.json")));
        assert!(!config.add_library(PathBuf::from(DEFAULT_LIBRARY_PATH)));
        assert_eq!(config.library_paths.len(), 2);
    }

    #[test]
    fn explicit_override_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/promptdeck.json")));
        assert_eq!(path, PathBuf::from("/etc/promptdeck.json"));
    }
}
