//! Persistence adapters for the task collection.
//!
//! The store talks to storage through the `Storage` trait and treats saving
//! as fire-and-forget: adapters report trouble on stderr and the in-memory
//! state stays authoritative. The on-disk encoding is adapter-private.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::task::Task;

/// Storage backend for the full task collection.
///
/// `load` is called once when a store opens; `save` receives the entire
/// ordered collection after every successful mutation. Records missing
/// optional fields must load with their defaults (see `Task`).
pub trait Storage {
    fn load(&mut self) -> Vec<Task>;
    fn save(&mut self, tasks: &[Task]);
}

/// JSON-file adapter: a pretty-printed array of tasks at a fixed path.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: PathBuf) -> Self {
        JsonFile { path }
    }

    fn write_atomic(&self, data: &str) -> std::io::Result<()> {
        // Atomic-ish write via temp + rename.
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for JsonFile {
    /// Load the task collection, starting fresh if the file is missing,
    /// unreadable or not valid JSON.
    fn load(&mut self) -> Vec<Task> {
        if !self.path.exists() {
            return Vec::new();
        }
        let mut buf = String::new();
        match File::open(&self.path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(tasks) => tasks,
                Err(e) => {
                    eprintln!("Error parsing tasks file, starting fresh: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                eprintln!("Error reading tasks file, starting fresh: {e}");
                Vec::new()
            }
        }
    }

    fn save(&mut self, tasks: &[Task]) {
        let data = serde_json::to_string_pretty(tasks).unwrap();
        if let Err(e) = self.write_atomic(&data) {
            eprintln!("Error saving tasks file: {e}");
        }
    }
}

/// In-memory adapter; used by tests and as an ephemeral backend.
#[derive(Default)]
pub struct MemoryStorage {
    tasks: Vec<Task>,
}

impl Storage for MemoryStorage {
    fn load(&mut self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn save(&mut self, tasks: &[Task]) {
        self.tasks = tasks.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    fn sample(id: u64, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            size: None,
            importance: None,
            due: None,
            description: String::new(),
            status: Status::Backlog,
            completed_at_utc: None,
            achievement: String::new(),
            parent: None,
            children: Vec::new(),
            collapsed: false,
            created_at_utc: 1_700_000_000,
            updated_at_utc: 1_700_000_000,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("todotree-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let mut store = JsonFile::new(temp_path("missing"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_path("roundtrip");
        let mut store = JsonFile::new(path.clone());
        let tasks = vec![sample(2, "second"), sample(1, "first")];
        store.save(&tasks);
        assert_eq!(store.load(), tasks);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_sparse_record_defaults() {
        let path = temp_path("sparse");
        fs::write(&path, r#"[{"id": 7, "title": "bare"}]"#).unwrap();
        let mut store = JsonFile::new(path.clone());
        let tasks = store.load();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.status, Status::Backlog);
        assert_eq!(t.parent, None);
        assert!(t.children.is_empty());
        assert!(!t.collapsed);
        assert_eq!(t.completed_at_utc, None);
        assert_eq!(t.achievement, "");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let path = temp_path("corrupt");
        fs::write(&path, "not json at all {").unwrap();
        let mut store = JsonFile::new(path.clone());
        assert!(store.load().is_empty());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_memory_round_trip() {
        let mut store = MemoryStorage::default();
        assert!(store.load().is_empty());
        store.save(&[sample(1, "kept")]);
        assert_eq!(store.load().len(), 1);
        assert_eq!(store.load()[0].title, "kept");
    }
}
