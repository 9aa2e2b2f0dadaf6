//! Student roster tools for the Aula agent.
//!
//! Each tool wraps one `StudentRepository` operation so the model can query
//! or extend the roster: search by name, search by surname, add a student,
//! and list everyone.

pub mod add_student;
pub mod list_students;
pub mod search;

use aula_core::error::ToolError;
use aula_core::student::{Lookup, StudentRepository};
use aula_core::tool::{ToolRegistry, ToolResult};
use std::sync::Arc;

pub use add_student::AddStudentTool;
pub use list_students::ListStudentsTool;
pub use search::{SearchByNameTool, SearchBySurnameTool};

/// Build a registry with the four roster tools, in the order they are
/// advertised to the model.
pub fn student_registry(store: Arc<dyn StudentRepository>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchByNameTool::new(store.clone())));
    registry.register(Box::new(SearchBySurnameTool::new(store.clone())));
    registry.register(Box::new(AddStudentTool::new(store.clone())));
    registry.register(Box::new(ListStudentsTool::new(store)));
    registry
}

/// Render a lookup for the model: matches as a JSON array, misses as the
/// sentence that explains them.
pub(crate) fn lookup_result(tool_name: &str, lookup: Lookup) -> Result<ToolResult, ToolError> {
    match lookup {
        Lookup::Found(students) => {
            let data =
                serde_json::to_value(&students).map_err(|e| ToolError::ExecutionFailed {
                    tool_name: tool_name.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: data.to_string(),
                data: Some(data),
            })
        }
        other => Ok(ToolResult::text(other.to_string())),
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}
