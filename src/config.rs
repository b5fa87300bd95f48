use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("tasklist")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("tasklist")
        .join(CONFIG_FILE)
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TasklistConfig {
    /// Where saved tasks live.
    pub data_directory: PathBuf,
    /// The fixed key the task collection is saved under.
    pub storage_key: String,
    /// Baseline task feed. Without one, startup only restores saved tasks.
    pub remote_url: Option<String>,
    pub debug_logging: bool,
}

impl Default for TasklistConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            remote_url: None,
            debug_logging: false,
        }
    }
}

impl TasklistConfig {
    /// Read the config at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `TASKLIST_*` overrides looked up through `var`.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("TASKLIST_REMOTE_URL") {
            let url = url.trim().to_string();
            self.remote_url = (!url.is_empty()).then_some(url);
        }
        if let Some(dir) = var("TASKLIST_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.data_directory = PathBuf::from(dir.trim());
        }
        if let Some(flag) = var("TASKLIST_DEBUG") {
            self.debug_logging = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
        self
    }

    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_directory.join(format!("{}.json", self.storage_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TasklistConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, TasklistConfig::default());
        assert_eq!(config.storage_key, "tasks");
        assert_eq!(config.remote_url(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"remote_url":"https://example.com/tasks.json"}"#).unwrap();
        let config = TasklistConfig::load(&path).unwrap();
        assert_eq!(config.remote_url(), Some("https://example.com/tasks.json"));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(!config.debug_logging);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{remote_url").unwrap();
        assert!(TasklistConfig::load(&path).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("TASKLIST_REMOTE_URL", " http://localhost:8080/tasks "),
            ("TASKLIST_DATA_DIR", "/tmp/tasks"),
            ("TASKLIST_DEBUG", "1"),
        ]
        .into_iter()
        .collect();
        let config = TasklistConfig::default()
            .with_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.remote_url(), Some("http://localhost:8080/tasks"));
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/tasks/tasks.json")
        );
        assert!(config.debug_logging);
    }

    #[test]
    fn blank_remote_override_disables_remote() {
        let config = TasklistConfig {
            remote_url: Some("https://example.com".to_string()),
            ..TasklistConfig::default()
        }
        .with_overrides(|name| (name == "TASKLIST_REMOTE_URL").then(String::new));
        assert_eq!(config.remote_url(), None);
    }
}
