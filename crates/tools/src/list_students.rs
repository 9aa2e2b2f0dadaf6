//! `listarEstudiantes` — return the whole roster.

use crate::lookup_result;
use async_trait::async_trait;
use aula_core::error::ToolError;
use aula_core::student::StudentRepository;
use aula_core::tool::{Tool, ToolResult};
use std::sync::Arc;

pub struct ListStudentsTool {
    store: Arc<dyn StudentRepository>,
}

impl ListStudentsTool {
    pub fn new(store: Arc<dyn StudentRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListStudentsTool {
    fn name(&self) -> &str {
        "listarEstudiantes"
    }

    fn description(&self) -> &str {
        "Usa esta función para mostrar todos los estudiantes"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        lookup_result(self.name(), self.store.list().await)
    }
}
