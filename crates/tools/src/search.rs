//! Search tools — case-insensitive substring lookup by name or surname.

use crate::{lookup_result, required_str};
use async_trait::async_trait;
use aula_core::error::ToolError;
use aula_core::student::StudentRepository;
use aula_core::tool::{Tool, ToolResult};
use std::sync::Arc;
use tracing::debug;

/// `buscarPorNombre` — find students whose name contains the query.
pub struct SearchByNameTool {
    store: Arc<dyn StudentRepository>,
}

impl SearchByNameTool {
    pub fn new(store: Arc<dyn StudentRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchByNameTool {
    fn name(&self) -> &str {
        "buscarPorNombre"
    }

    fn description(&self) -> &str {
        "Usa esta función para encontrar estudiantes por su nombre"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "nombre": {
                    "type": "string",
                    "description": "El nombre del estudiante a buscar"
                }
            },
            "required": ["nombre"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&arguments, "nombre")?;
        debug!(query, "Searching students by name");
        lookup_result(self.name(), self.store.find_by_name(query).await)
    }
}

/// `buscarPorApellido` — find students whose surname contains the query.
pub struct SearchBySurnameTool {
    store: Arc<dyn StudentRepository>,
}

impl SearchBySurnameTool {
    pub fn new(store: Arc<dyn StudentRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchBySurnameTool {
    fn name(&self) -> &str {
        "buscarPorApellido"
    }

    fn description(&self) -> &str {
        "Usa esta función para encontrar estudiantes por su apellido"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "apellido": {
                    "type": "string",
                    "description": "El apellido del estudiante a buscar"
                }
            },
            "required": ["apellido"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&arguments, "apellido")?;
        debug!(query, "Searching students by surname");
        lookup_result(self.name(), self.store.find_by_surname(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::student::Student;
    use aula_store::InMemoryStore;

    fn store() -> Arc<dyn StudentRepository> {
        Arc::new(InMemoryStore::with_students(vec![
            Student::new("Ana", "Perez", "4A"),
            Student::new("Juan", "Gomez", "5B"),
        ]))
    }

    #[tokio::test]
    async fn name_hit_returns_json_array() {
        let tool = SearchByNameTool::new(store());
        let result = tool
            .execute(serde_json::json!({"nombre": "ana"}))
            .await
            .unwrap();
        assert!(result.success);
        let parsed: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{"nombre": "Ana", "apellido": "Perez", "curso": "4A"}])
        );
        assert_eq!(result.data, Some(parsed));
    }

    #[tokio::test]
    async fn name_miss_returns_sentence() {
        let tool = SearchByNameTool::new(store());
        let result = tool
            .execute(serde_json::json!({"nombre": "Zoe"}))
            .await
            .unwrap();
        assert_eq!(
            result.output,
            "No se encontraron estudiantes con el nombre \"Zoe\"."
        );
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn surname_hit() {
        let tool = SearchBySurnameTool::new(store());
        let result = tool
            .execute(serde_json::json!({"apellido": "GOM"}))
            .await
            .unwrap();
        assert!(result.output.contains("Juan"));
        assert!(!result.output.contains("Ana"));
    }

    #[tokio::test]
    async fn missing_argument_is_invalid() {
        let tool = SearchBySurnameTool::new(store());
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
