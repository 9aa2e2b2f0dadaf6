//! JSON file backend — the roster lives in one pretty-printed file.
//!
//! File shape: `{"alumnos": [{"nombre", "apellido", "curso"}, ...]}` with
//! 2-space indentation, rewritten in full on every addition.
//!
//! Records are loaded into memory once and every `add` flushes the whole
//! collection. `add` holds the write lock across the append and the flush,
//! so concurrent additions are applied one at a time and the file always
//! reflects the in-memory collection. The flush goes to a sibling temp file
//! that is renamed over the target.

use async_trait::async_trait;
use aula_core::error::StoreError;
use aula_core::student::{Roster, Student, StudentRepository};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub struct JsonFileStore {
    path: PathBuf,
    students: RwLock<Vec<Student>>,
    strict_writes: bool,
}

impl JsonFileStore {
    /// Create a store bound to `path` with an empty collection.
    /// Call `load()` (or use `open`) to read the file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            students: RwLock::new(Vec::new()),
            strict_writes: false,
        }
    }

    /// Create a store and load the file in one go.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        store.load().await;
        store
    }

    /// When enabled, a failed flush rolls back the addition and surfaces the
    /// error instead of keeping the record in memory only.
    pub fn with_strict_writes(mut self, strict: bool) -> Self {
        self.strict_writes = strict;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_roster(path: &Path) -> Result<Vec<Student>, StoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let parse_err = |reason: String| StoreError::Parse {
            path: path.display().to_string(),
            reason,
        };

        let document: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?;

        let records = match document.get("alumnos") {
            None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
            Some(serde_json::Value::Array(records)) => records,
            Some(other) => return Err(parse_err(format!("\"alumnos\" is not an array: {other}"))),
        };

        // One bad record must not cost the rest of the roster.
        let mut students = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match serde_json::from_value::<Student>(record.clone()) {
                Ok(student) => students.push(student),
                Err(e) => {
                    warn!(path = %path.display(), index, error = %e, "Skipping unreadable student record");
                }
            }
        }

        Ok(students)
    }

    async fn write_roster(path: &Path, students: &[Student]) -> Result<(), StoreError> {
        let write_err = |reason: String| StoreError::Write {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(format!("Failed to create directory: {e}")))?;
        }

        let roster = Roster {
            alumnos: students.to_vec(),
        };
        let content =
            serde_json::to_string_pretty(&roster).map_err(|e| write_err(e.to_string()))?;

        let tmp = temp_path(path);
        let flushed = match tokio::fs::write(&tmp, content).await {
            Ok(()) => tokio::fs::rename(&tmp, path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = flushed {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e.to_string()));
        }

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "alumnos.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl StudentRepository for JsonFileStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn load(&self) {
        let loaded = match Self::read_roster(&self.path).await {
            Ok(students) => {
                info!(path = %self.path.display(), count = students.len(), "Students loaded from JSON");
                students
            }
            Err(e) => {
                warn!(error = %e, "Could not load students, starting with an empty roster");
                Vec::new()
            }
        };
        *self.students.write().await = loaded;
    }

    async fn save(&self) -> Result<(), StoreError> {
        // Write guard so flushes never share the temp file.
        let students = self.students.write().await;
        Self::write_roster(&self.path, &students).await?;
        debug!(path = %self.path.display(), count = students.len(), "Students saved to JSON");
        Ok(())
    }

    async fn add(&self, student: Student) -> Result<String, StoreError> {
        let message = student.added_message();
        let mut students = self.students.write().await;
        students.push(student);

        match Self::write_roster(&self.path, &students).await {
            Ok(()) => {
                debug!(path = %self.path.display(), count = students.len(), "Students saved to JSON");
            }
            Err(e) if self.strict_writes => {
                students.pop();
                error!(error = %e, "Failed to persist new student, addition rolled back");
                return Err(e);
            }
            Err(e) => {
                error!(error = %e, "Failed to persist new student, kept in memory only");
            }
        }

        Ok(message)
    }

    async fn snapshot(&self) -> Vec<Student> {
        self.students.read().await.clone()
    }

    async fn len(&self) -> usize {
        self.students.read().await.len()
    }
}
