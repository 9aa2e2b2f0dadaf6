//! The reply handed back to callers after one chat turn.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Shown when the model produced nothing usable.
pub const EMPTY_REPLY_FALLBACK: &str = "No pude obtener una respuesta clara del asistente.";

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("think pattern is valid"));

/// The final answer of a chat turn. Always non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub text: String,
}

impl AgentReply {
    /// Build a reply from raw model output: reasoning blocks are removed,
    /// whitespace trimmed, and an empty result replaced by the fallback.
    pub fn from_model_text(raw: &str) -> Self {
        let cleaned = strip_think(raw);
        if cleaned.is_empty() {
            Self::fixed(EMPTY_REPLY_FALLBACK)
        } else {
            Self { text: cleaned }
        }
    }

    /// A reply with text that is not model output (notices, error guidance).
    pub fn fixed(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Remove every `<think>...</think>` block and trim the rest.
pub fn strip_think(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}
