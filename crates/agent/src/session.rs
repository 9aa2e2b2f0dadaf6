//! Chat session — one stateless agent turn per message.
//!
//! Each call starts a fresh conversation (system prompt + user message),
//! runs the agent loop, and hands back a cleaned [`AgentReply`]. Failures
//! of the model backend become Spanish guidance for the end user instead
//! of errors.

use crate::loop_runner::{AgentLoop, TurnOptions};
use crate::reply::AgentReply;
use aula_config::AppConfig;
use aula_core::error::{Error, ProviderError};
use aula_core::message::Conversation;
use aula_core::provider::Provider;
use aula_core::student::StudentRepository;
use std::sync::Arc;
use tracing::{error, info};

pub const DEFAULT_SYSTEM_PROMPT: &str = "Sos un asistente para gestionar estudiantes.
Tu tarea es ayudar a consultar o modificar una base de datos de alumnos.

Usá las herramientas disponibles para:
- Buscar estudiantes por nombre o apellido
- Agregar nuevos estudiantes
- Mostrar la lista completa de estudiantes

Respondé de forma clara y breve.";

pub const GENERIC_ERROR_REPLY: &str = "Hubo un error al procesar tu mensaje.";

pub const TIMEOUT_REPLY: &str =
    "El modelo tardó demasiado en responder. Probá de nuevo o usá un modelo más chico.";

/// The chat entry point shared by the HTTP service and the CLI.
pub struct AgentSession {
    agent: AgentLoop,
    store: Arc<dyn StudentRepository>,
    system_prompt: String,
}

impl AgentSession {
    pub fn new(agent: AgentLoop, store: Arc<dyn StudentRepository>) -> Self {
        Self {
            agent,
            store,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }

    /// Wire a session from configuration: the roster tools over `store`,
    /// the configured model defaults, iteration cap and system prompt.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn StudentRepository>,
    ) -> Self {
        let tools = Arc::new(aula_tools::student_registry(store.clone()));
        let agent = AgentLoop::new(
            provider,
            &config.default_model,
            config.default_temperature,
            tools,
        )
        .with_max_iterations(config.max_tool_iterations);
        let agent = match config.max_tokens {
            Some(max) => agent.with_max_tokens(max),
            None => agent,
        };

        let session = Self::new(agent, store);
        match &config.system_prompt {
            Some(prompt) => session.with_system_prompt(prompt),
            None => session,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn store(&self) -> &Arc<dyn StudentRepository> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        self.agent.provider()
    }

    /// Run one chat turn.
    ///
    /// Backend and tool failures come back as `Ok` with a Spanish
    /// explanation. Only failures outside the model exchange are `Err`.
    pub async fn chat(&self, message: &str, options: TurnOptions) -> Result<AgentReply, Error> {
        let mut conversation = Conversation::seeded(&self.system_prompt, message);
        let model = self.agent.model_for(&options).to_string();

        match self.agent.process(&mut conversation, &options).await {
            Ok(text) => {
                info!(model = %model, tool_results = conversation.tool_results(), "Chat turn completed");
                Ok(AgentReply::from_model_text(&text))
            }
            Err(e) => {
                error!(model = %model, error = %e, "Chat turn failed");
                match self.translate(&e, &model) {
                    Some(text) => Ok(AgentReply::fixed(text)),
                    None => Err(e),
                }
            }
        }
    }

    /// Map an agent failure to user guidance, or `None` when it is not a
    /// model exchange failure.
    fn translate(&self, error: &Error, model: &str) -> Option<String> {
        let text = match error {
            Error::Provider(ProviderError::ConnectionRefused { url, .. }) => {
                connection_refused_reply(url)
            }
            Error::Provider(ProviderError::ModelNotFound(missing)) => model_not_found_reply(missing),
            Error::Provider(ProviderError::Timeout(_)) => TIMEOUT_REPLY.into(),
            Error::Provider(_) | Error::Tool(_) => {
                let detail = error.to_string().to_lowercase();
                if detail.contains("connection refused") || detail.contains("econnrefused") {
                    connection_refused_reply(self.provider().base_url())
                } else if detail.contains("not found") {
                    model_not_found_reply(model)
                } else {
                    GENERIC_ERROR_REPLY.into()
                }
            }
            _ => return None,
        };
        Some(text)
    }
}

fn connection_refused_reply(url: &str) -> String {
    format!(
        "No se pudo conectar con el servidor de modelos. Verificá que Ollama esté corriendo (ollama serve) en {url}."
    )
}

fn model_not_found_reply(model: &str) -> String {
    format!(
        "El modelo \"{model}\" no está disponible. Descargalo con \"ollama pull {model}\" o elegí otro modelo."
    )
}
