//! `agregarEstudiante` — append a student to the roster and persist it.

use crate::required_str;
use async_trait::async_trait;
use aula_core::error::ToolError;
use aula_core::student::{Student, StudentRepository};
use aula_core::tool::{Tool, ToolResult};
use std::sync::Arc;
use tracing::info;

pub struct AddStudentTool {
    store: Arc<dyn StudentRepository>,
}

impl AddStudentTool {
    pub fn new(store: Arc<dyn StudentRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddStudentTool {
    fn name(&self) -> &str {
        "agregarEstudiante"
    }

    fn description(&self) -> &str {
        "Usa esta función para agregar un nuevo estudiante"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "nombre": {
                    "type": "string",
                    "description": "El nombre del estudiante"
                },
                "apellido": {
                    "type": "string",
                    "description": "El apellido del estudiante"
                },
                "curso": {
                    "type": "string",
                    "description": "El curso del estudiante (ej: 4A, 4B, 5A)"
                }
            },
            "required": ["nombre", "apellido", "curso"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let student = Student::new(
            required_str(&arguments, "nombre")?,
            required_str(&arguments, "apellido")?,
            required_str(&arguments, "curso")?,
        );

        info!(name = %student.name, surname = %student.surname, course = %student.course, "Adding student");

        let message = self
            .store
            .add(student)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::text(message))
    }
}
