//! HTTP chat service for Aula.
//!
//! Exposes `POST /api/chat` for the chat page, a health check, and the
//! embedded frontend. Each chat request runs one agent turn on its own task.
//!
//! Built on Axum for high performance async HTTP.

pub mod frontend;

use aula_agent::{AgentSession, TurnOptions};
use aula_core::student::StudentRepository;
use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

pub const MISSING_MESSAGE_ERROR: &str = "El campo \"mensaje\" es requerido.";
pub const INTERNAL_ERROR: &str = "Error interno del servidor al procesar el mensaje.";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub session: Arc<AgentSession>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with the API routes and, optionally, the chat page.
///
/// Layers applied:
/// - CORS open to any origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(session: Arc<AgentSession>, serve_frontend: bool) -> Router {
    let state = Arc::new(GatewayState { session });

    let mut app = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    if serve_frontend {
        app = app.merge(frontend::frontend_router());
    }

    app.layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server over `store` and run until Ctrl-C.
pub async fn start(
    config: aula_config::AppConfig,
    store: Arc<dyn StudentRepository>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = aula_providers::router::build_from_config(&config);
    let provider = router.default().ok_or_else(|| {
        format!(
            "Provider '{}' is not configured",
            config.default_provider
        )
    })?;

    info!(
        provider = %provider.name(),
        base_url = %provider.base_url(),
        model = %config.default_model,
        store = %store.name(),
        students = store.len().await,
        "Chat session ready"
    );

    let session = Arc::new(AgentSession::from_config(&config, provider, store));
    let app = build_router(session, config.gateway.serve_frontend);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway shut down");
    Ok(())
}

/// Wait for Ctrl-C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub mensaje: Option<String>,

    #[serde(default, deserialize_with = "drop_ill_typed")]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "drop_ill_typed")]
    pub temperature: Option<f32>,
}

/// Optional tuning fields are best-effort: a wrong type means "use the default".
fn drop_ill_typed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl ChatRequest {
    fn options(&self) -> TurnOptions {
        TurnOptions {
            model: self
                .model
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from),
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub respuesta: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat request body");
            return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE_ERROR);
        }
    };

    let Some(mensaje) = request.mensaje.clone().filter(|m| !m.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_MESSAGE_ERROR);
    };

    let options = request.options();
    info!(message_len = mensaje.len(), model = ?options.model, "Chat message received");

    // A panicking turn only takes down its own task.
    let session = state.session.clone();
    let turn = tokio::spawn(async move { session.chat(&mensaje, options).await });

    match turn.await {
        Ok(Ok(reply)) => (
            StatusCode::OK,
            Json(ChatResponse {
                respuesta: reply.text,
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "Chat turn failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
        Err(e) => {
            error!(error = %e, "Chat turn aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    students: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        students: state.session.store().len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_config::AppConfig;
    use aula_core::error::ProviderError;
    use aula_core::message::Message;
    use aula_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use aula_core::student::Student;
    use aula_store::InMemoryStore;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Echoes a fixed reply and remembers the last request.
    struct MockProvider {
        reply: String,
        last: Mutex<Option<ProviderRequest>>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let model = request.model.clone();
            *self.last.lock().unwrap() = Some(request);
            Ok(ProviderResponse {
                message: Message::assistant(&self.reply),
                usage: None,
                model,
            })
        }
    }

    /// Panics mid-turn.
    struct PanickingProvider;

    #[async_trait::async_trait]
    impl Provider for PanickingProvider {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            panic!("backend exploded");
        }
    }

    fn mock(reply: &str) -> Arc<MockProvider> {
        Arc::new(MockProvider {
            reply: reply.into(),
            last: Mutex::new(None),
        })
    }

    fn app_with(provider: Arc<dyn Provider>, students: Vec<Student>) -> Router {
        let session = AgentSession::from_config(
            &AppConfig::default(),
            provider,
            Arc::new(InMemoryStore::with_students(students)),
        );
        build_router(Arc::new(session), true)
    }

    fn post_chat(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_respuesta() {
        let app = app_with(mock("Hola, soy el asistente."), vec![]);
        let response = app
            .oneshot(post_chat(r#"{"mensaje":"Hola"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"respuesta": "Hola, soy el asistente."})
        );
    }

    #[tokio::test]
    async fn chat_strips_think_blocks() {
        let app = app_with(mock("<think>\nrazono\n</think>\nHay 2 alumnos."), vec![]);
        let response = app
            .oneshot(post_chat(r#"{"mensaje":"¿Cuántos hay?"}"#))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["respuesta"], "Hay 2 alumnos.");
    }

    #[tokio::test]
    async fn chat_passes_model_and_temperature() {
        let provider = mock("ok");
        let app = app_with(provider.clone(), vec![]);
        let response = app
            .oneshot(post_chat(
                r#"{"mensaje":"Hola","model":"llama3.2","temperature":0.2}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let last = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(last.model, "llama3.2");
        assert!((last.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn blank_model_falls_back_to_default() {
        let provider = mock("ok");
        let app = app_with(provider.clone(), vec![]);
        app.oneshot(post_chat(r#"{"mensaje":"Hola","model":"  "}"#))
            .await
            .unwrap();

        let last = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(last.model, "qwen3:1.7b");
    }

    #[tokio::test]
    async fn ill_typed_tuning_fields_are_ignored() {
        let provider = mock("ok");
        let app = app_with(provider.clone(), vec![]);
        let response = app
            .oneshot(post_chat(
                r#"{"mensaje":"Hola","model":7,"temperature":"0.5"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["respuesta"], "ok");

        let last = provider.last.lock().unwrap().take().unwrap();
        assert_eq!(last.model, "qwen3:1.7b");
        assert!((last.temperature - 0.75).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn invalid_bodies_are_rejected_with_400() {
        for body in [
            r#"{}"#,
            r#"{"mensaje":""}"#,
            r#"{"mensaje":42}"#,
            r#"{"mensaje":null}"#,
            "not json",
        ] {
            let app = app_with(mock("unused"), vec![]);
            let response = app.oneshot(post_chat(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(
                json_body(response).await,
                serde_json::json!({"error": MISSING_MESSAGE_ERROR})
            );
        }
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected_with_400() {
        let app = app_with(mock("unused"), vec![]);
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .body(Body::from(r#"{"mensaje":"Hola"}"#))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn panicking_turn_is_500() {
        let app = app_with(Arc::new(PanickingProvider), vec![]);
        let response = app
            .oneshot(post_chat(r#"{"mensaje":"Hola"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": INTERNAL_ERROR})
        );
    }

    #[tokio::test]
    async fn health_reports_student_count() {
        let app = app_with(
            mock("unused"),
            vec![
                Student::new("Ana", "Perez", "4A"),
                Student::new("Juan", "Gomez", "5B"),
            ],
        );
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["students"], 2);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let app = app_with(mock("unused"), vec![]);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn frontend_can_be_disabled() {
        let session = AgentSession::from_config(
            &AppConfig::default(),
            mock("unused"),
            Arc::new(InMemoryStore::new()),
        );
        let app = build_router(Arc::new(session), false);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
