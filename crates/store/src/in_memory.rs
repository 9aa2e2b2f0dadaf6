//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use aula_core::error::StoreError;
use aula_core::student::{Student, StudentRepository};
use tokio::sync::RwLock;
use tracing::debug;

/// A roster that only lives as long as the process.
pub struct InMemoryStore {
    students: RwLock<Vec<Student>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_students(Vec::new())
    }

    /// Seed the store with existing records.
    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students: RwLock::new(students),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentRepository for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) {
        debug!("In-memory roster has nothing to load");
    }

    async fn save(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn add(&self, student: Student) -> Result<String, StoreError> {
        let message = student.added_message();
        self.students.write().await.push(student);
        Ok(message)
    }

    async fn snapshot(&self) -> Vec<Student> {
        self.students.read().await.clone()
    }
}
