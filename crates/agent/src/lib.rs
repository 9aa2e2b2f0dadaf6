//! The agent loop and chat session for Aula.
//!
//! One chat turn follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Seed** the conversation with the system prompt and the user message
//! 2. **Send to LLM** via the configured provider, with the roster tools
//! 3. **If tool calls**: execute them in order, append results, loop back to 2
//! 4. **If text response**: strip reasoning blocks and return the reply
//!
//! The loop continues until the LLM responds with text only (no tool calls)
//! or the max iteration limit is reached. Backend failures are turned into
//! Spanish guidance for the end user by [`AgentSession`].

pub mod loop_runner;
pub mod reply;
pub mod session;

pub use loop_runner::{AgentLoop, TurnOptions};
pub use reply::AgentReply;
pub use session::{AgentSession, DEFAULT_SYSTEM_PROMPT};
