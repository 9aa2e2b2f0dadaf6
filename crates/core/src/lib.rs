//! # Aula Core
//!
//! Domain types, traits, and error definitions for the Aula student assistant.
//! This crate has **no framework dependencies** — it defines the domain model
//! that the store, provider, tool, agent and gateway crates implement against.
//!
//! Every seam is a trait here (`StudentRepository`, `Provider`, `Tool`), so
//! tests can swap in in-memory stores and scripted model backends.

pub mod error;
pub mod message;
pub mod provider;
pub mod student;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use student::{Lookup, LookupField, Student, StudentRepository};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
