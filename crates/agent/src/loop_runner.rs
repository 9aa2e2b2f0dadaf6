//! The agent reasoning loop implementation.

use aula_core::message::{Conversation, Message};
use aula_core::provider::{Provider, ProviderRequest};
use aula_core::tool::{ToolCall, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned when the model keeps calling tools past the iteration cap.
pub const MAX_ITERATIONS_NOTICE: &str = "Alcancé el límite de consultas a las herramientas para este mensaje. Probá reformular la pregunta.";

/// Per-turn overrides of the loop defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnOptions {
    #[serde(default)]
    pub model: Option<String>,

    /// Passed through as-is; backends decide what range they accept.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl TurnOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Default model, overridable per turn
    model: String,

    /// Default temperature, overridable per turn
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Maximum tool call iterations per turn
    max_iterations: u32,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            max_iterations: 10,
        }
    }

    /// Set the maximum number of tool call iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The model a turn with `options` will use.
    pub fn model_for<'a>(&'a self, options: &'a TurnOptions) -> &'a str {
        options.model.as_deref().unwrap_or(&self.model)
    }

    /// Run one turn over `conversation` and return the model's final text.
    ///
    /// The conversation is expected to already hold the system prompt and
    /// the user message. Tool calls are executed sequentially in the order
    /// the model emitted them; failures are reported back to the model as
    /// `Error: ...` tool results so it can recover.
    pub async fn process(
        &self,
        conversation: &mut Conversation,
        options: &TurnOptions,
    ) -> Result<String, aula_core::Error> {
        let model = self.model_for(options).to_string();
        let temperature = options.temperature.unwrap_or(self.temperature);

        info!(
            model = %model,
            temperature,
            messages = conversation.messages.len(),
            "Processing conversation"
        );

        let tool_definitions = self.tools.definitions();
        let mut iteration = 0;

        loop {
            iteration += 1;

            if iteration > self.max_iterations {
                warn!(
                    iterations = self.max_iterations,
                    "Max tool iterations reached, giving up on this turn"
                );
                break;
            }

            debug!(iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: model.clone(),
                messages: conversation.messages.clone(),
                temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    model = %response.model,
                    tokens = usage.total_tokens,
                    "Provider usage"
                );
            }

            if response.message.tool_calls.is_empty() {
                let response_text = response.message.content.clone();
                conversation.push(response.message);
                return Ok(response_text);
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                let start = std::time::Instant::now();
                let result = self.tools.execute(&call).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match result {
                    Ok(tool_result) => {
                        debug!(tool = %tc.name, success = tool_result.success, duration_ms, "Tool executed");
                        conversation.push(Message::tool_result(&tc.id, &tool_result.output));
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, duration_ms, "Tool execution failed");
                        conversation.push(Message::tool_result(&tc.id, format!("Error: {e}")));
                    }
                }
            }
        }

        Ok(MAX_ITERATIONS_NOTICE.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::error::ProviderError;
    use aula_core::message::{MessageToolCall, Role};
    use aula_core::provider::{ProviderResponse, Usage};
    use aula_core::student::{Student, StudentRepository};
    use aula_store::InMemoryStore;
    use std::sync::Mutex;

    /// Replays a fixed list of responses and records every request.
    struct ScriptedProvider {
        responses: Mutex<Vec<Message>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(mut responses: Vec<Message>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let message = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Message::assistant("(script exhausted)"));
            Ok(ProviderResponse {
                message,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    /// A provider that asks for the same tool forever.
    struct LoopingProvider;

    #[async_trait::async_trait]
    impl Provider for LoopingProvider {
        fn name(&self) -> &str {
            "looping"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: tool_call("call", "listarEstudiantes", "{}"),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> Message {
        let mut msg = Message::assistant("");
        msg.tool_calls = vec![MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }];
        msg
    }

    fn roster_tools(store: Arc<InMemoryStore>) -> Arc<ToolRegistry> {
        Arc::new(aula_tools::student_registry(store))
    }

    #[tokio::test]
    async fn simple_text_response() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant(
            "¡Hola! ¿En qué te ayudo?",
        )]));
        let agent = AgentLoop::new(provider, "mock-model", 0.7, Arc::new(ToolRegistry::new()));

        let mut conv = Conversation::seeded("system", "Hola");
        let response = agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        assert_eq!(response, "¡Hola! ¿En qué te ayudo?");
        // System + User + Assistant = 3 messages
        assert_eq!(conv.messages.len(), 3);
    }

    #[tokio::test]
    async fn tool_call_then_answer() {
        let store = Arc::new(InMemoryStore::with_students(vec![Student::new(
            "Ana", "Perez", "4A",
        )]));
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("call_1", "buscarPorNombre", r#"{"nombre":"ana"}"#),
            Message::assistant("Encontré a Ana Perez del curso 4A."),
        ]));
        let agent = AgentLoop::new(provider.clone(), "mock-model", 0.7, roster_tools(store));

        let mut conv = Conversation::seeded("system", "¿Está Ana?");
        let response = agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        assert_eq!(response, "Encontré a Ana Perez del curso 4A.");
        assert_eq!(conv.tool_results(), 1);
        let tool_msg = conv.messages.iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.contains("\"nombre\":\"Ana\""));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 4);
    }

    #[tokio::test]
    async fn add_tool_mutates_store() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call(
                "call_1",
                "agregarEstudiante",
                r#"{"nombre":"Juan","apellido":"Gomez","curso":"5B"}"#,
            ),
            Message::assistant("Listo, agregué a Juan."),
        ]));
        let agent = AgentLoop::new(provider, "mock-model", 0.7, roster_tools(store.clone()));

        let mut conv = Conversation::seeded("system", "Agregá a Juan Gomez de 5B");
        agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        assert_eq!(store.snapshot().await, vec![Student::new("Juan", "Gomez", "5B")]);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("call_1", "borrarTodo", "{}"),
            Message::assistant("No puedo hacer eso."),
        ]));
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.7,
            roster_tools(Arc::new(InMemoryStore::new())),
        );

        let mut conv = Conversation::seeded("system", "Borrá todo");
        let response = agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        assert_eq!(response, "No puedo hacer eso.");
        let tool_msg = conv.messages.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_msg.content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn malformed_arguments_become_invalid_arguments_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call("call_1", "buscarPorApellido", "not json"),
            Message::assistant("Perdón, no entendí."),
        ]));
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            0.7,
            roster_tools(Arc::new(InMemoryStore::new())),
        );

        let mut conv = Conversation::seeded("system", "Buscá");
        agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        let tool_msg = conv.messages.iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(tool_msg.content.contains("apellido"), "{}", tool_msg.content);
    }

    #[tokio::test]
    async fn turn_options_override_defaults() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant("ok")]));
        let agent = AgentLoop::new(provider.clone(), "qwen3:1.7b", 0.75, Arc::new(ToolRegistry::new()));

        let options = TurnOptions::default()
            .with_model("llama3.2")
            .with_temperature(1.9);
        let mut conv = Conversation::seeded("system", "Hola");
        agent.process(&mut conv, &options).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].model, "llama3.2");
        assert!((requests[0].temperature - 1.9).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn iteration_cap_returns_notice() {
        let agent = AgentLoop::new(
            Arc::new(LoopingProvider),
            "mock-model",
            0.7,
            roster_tools(Arc::new(InMemoryStore::new())),
        )
        .with_max_iterations(3);

        let mut conv = Conversation::seeded("system", "Listá");
        let response = agent.process(&mut conv, &TurnOptions::default()).await.unwrap();

        assert_eq!(response, MAX_ITERATIONS_NOTICE);
        assert_eq!(conv.tool_results(), 3);
    }
}
