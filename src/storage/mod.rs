pub mod merge;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::record::{TaskRecord, decode_records, encode_records};
use crate::core::task::Task;
use crate::error::{Error, Result};

/// A durable string key-value store.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`. Writes replace the file atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        std::fs::write(&tmp, value)?;
        if let Err(e) = std::fs::rename(&tmp, self.path_for(key)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// In-process store with no durability.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// When set every write fails, standing in for a full disk.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "quota exceeded",
            )));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The task collection's slot in a [`KeyValueStore`], under one fixed key.
#[derive(Debug, Clone)]
pub struct TaskStorage<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> TaskStorage<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Replace the stored collection with `tasks`.
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let records: Vec<TaskRecord> = tasks.iter().map(Task::to_record).collect();
        let json = encode_records(&records)?;
        self.backend.write(&self.key, &json)?;
        log::debug!("Saved {} tasks under {:?}", records.len(), self.key);
        Ok(())
    }

    /// Read the stored records. Absent, unreadable or malformed data yields nothing.
    pub fn load(&self) -> Vec<TaskRecord> {
        let content = match self.backend.read(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                log::debug!("No saved tasks under {:?}", self.key);
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Failed to read saved tasks: {}", e);
                return Vec::new();
            }
        };
        match decode_records(&content) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Ignoring malformed saved tasks: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::Category;
    use crate::core::urgency::{DueDate, Urgency};
    use chrono::NaiveDate;

    fn sample_tasks() -> Vec<Task> {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vec![
            Task::new(
                1u64,
                Category::new(1).unwrap(),
                Urgency::Unurgent,
                DueDate::Unset,
                "water plants",
                "Dana",
                now,
            ),
            Task::new(
                "x",
                Category::new(4).unwrap(),
                Urgency::Low,
                DueDate::parse("2025-03-01"),
                "",
                "Omer",
                now,
            ),
        ]
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.read("tasks").unwrap(), None);
        store.write("tasks", "[]").unwrap();
        store.write("tasks", "[1]").unwrap();
        assert_eq!(store.read("tasks").unwrap().as_deref(), Some("[1]"));

        // No temp files left behind.
        let names: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["tasks.json".to_string()]);
    }

    #[test]
    fn save_then_load_gives_same_tasks() {
        let tasks = sample_tasks();
        let mut storage = TaskStorage::new(MemoryStore::new(), "tasks");
        storage.save(&tasks).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let loaded: Vec<Task> = storage
            .load()
            .into_iter()
            .map(|r| Task::from_record(r, now).unwrap())
            .collect();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn load_tolerates_missing_and_malformed_data() {
        let mut storage = TaskStorage::new(MemoryStore::new(), "tasks");
        assert!(storage.load().is_empty());

        storage.backend_mut().insert("tasks", "{not json");
        assert!(storage.load().is_empty());

        storage.backend_mut().insert("tasks", r#""a string""#);
        assert!(storage.load().is_empty());
    }

    #[test]
    fn write_failures_surface_as_errors() {
        let mut storage = TaskStorage::new(MemoryStore::new(), "tasks");
        storage.backend_mut().fail_writes = true;
        assert!(matches!(storage.save(&sample_tasks()), Err(Error::Io(_))));
        assert_eq!(storage.backend().get("tasks"), None);
    }
}
