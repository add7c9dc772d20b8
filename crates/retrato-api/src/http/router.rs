//! Axum router configuration with middleware.
//!
//! API routes live under `/api/`. Middleware: CORS (any origin), tracing.
//!
//! When `server.static_dir` exists, its files are served for every other
//! path and `/` answers with `server.index_file`. Otherwise only the API is
//! served.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/start", post(handlers::chat::start));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check));

    if state.static_dir.is_dir() {
        let index_path = state.static_dir.join(&state.index_file);
        router = router
            .route_service("/", ServeFile::new(&index_path))
            .fallback_service(ServeDir::new(&state.static_dir));
        tracing::info!(
            path = %state.static_dir.display(),
            index = %state.index_file,
            "Static file serving enabled"
        );
    } else {
        tracing::warn!(
            path = %state.static_dir.display(),
            "Static directory not found, serving the API only"
        );
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus provider and persistence state.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let coordinator = state.interview.coordinator();
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "primaryEnabled": coordinator.primary_enabled(),
        "providers": coordinator.status(),
        "persistence": state.persistence_enabled,
        "sessions": state.interview.sessions().len(),
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use retrato_core::interview::service::{InterviewScript, InterviewService};
    use retrato_core::interview::session::InMemorySessionStore;
    use retrato_core::llm::box_provider::BoxLlmProvider;
    use retrato_core::llm::fallback::{FallbackCoordinator, ProviderRoute};
    use retrato_core::llm::provider::LlmProvider;
    use retrato_core::repository::DisabledSink;
    use retrato_infra::persistence::ConfiguredSink;
    use retrato_types::config::{BackoffStrategy, RetratoConfig, RetryPolicy};
    use retrato_types::llm::{CompletionRequest, CompletionResponse, LlmError, RoleVocabulary};

    use super::*;

    const PORTRAIT_REPLY: &str = "Pronto!\n```json\n{\"tipo\": \"retrato\", \"dados\": {\"nome\": \"Ana\", \"email\": \"ana@example.com\", \"profissao\": \"Contadora\"}}\n```";

    /// Replies with a fixed text, or with the number of messages it was sent.
    enum Canned {
        Text(&'static str),
        CountMessages,
        Down,
    }

    impl LlmProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn vocabulary(&self) -> RoleVocabulary {
            RoleVocabulary::OPENAI
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let content = match self {
                Canned::Text(text) => text.to_string(),
                Canned::CountMessages => format!("{} messages", request.messages.len()),
                Canned::Down => {
                    return Err(LlmError::Provider {
                        message: "canned is down".to_string(),
                    });
                }
            };
            Ok(CompletionResponse {
                content,
                model: "canned-1".to_string(),
            })
        }
    }

    fn route(provider: Canned) -> ProviderRoute {
        ProviderRoute::new(
            BoxLlmProvider::new(provider),
            RetryPolicy {
                max_retries: 0,
                backoff: BackoffStrategy::Linear { step_ms: 0 },
            },
            Duration::from_secs(5),
        )
    }

    fn app_with(
        primary: Option<Canned>,
        secondary: Option<Canned>,
        config: &RetratoConfig,
    ) -> Router {
        let coordinator = FallbackCoordinator::new(primary.map(route), secondary.map(route));
        let script = InterviewScript {
            system_prompt: "Você é a Samantha.".to_string(),
            opening_instruction: "Apresente-se.".to_string(),
            opening_record: "Inicie a conversa se apresentando".to_string(),
        };
        let service = InterviewService::new(
            coordinator,
            InMemorySessionStore::new(),
            ConfiguredSink::Disabled(DisabledSink),
            script,
        );
        build_router(AppState::new(service, false, config))
    }

    fn app(primary: Option<Canned>, secondary: Option<Canned>) -> Router {
        let mut config = RetratoConfig::default();
        config.server.static_dir = "/nonexistent/retrato-static".into();
        app_with(primary, secondary, &config)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_slots() {
        let app = app(Some(Canned::CountMessages), None);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["primaryEnabled"], true);
        assert_eq!(body["persistence"], false);
        assert_eq!(body["providers"][0]["slot"], "primary");
    }

    #[tokio::test]
    async fn test_chat_missing_message_is_400() {
        let app = app(Some(Canned::CountMessages), None);
        let response = app
            .oneshot(post_json("/api/chat", json!({ "sessionId": "s1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Message required" }));
    }

    #[tokio::test]
    async fn test_chat_bad_history_role_is_400() {
        let app = app(Some(Canned::CountMessages), None);
        let body = json!({
            "message": "oi",
            "history": [{ "role": "narrator", "text": "x" }],
        });
        let response = app.oneshot(post_json("/api/chat", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_uses_caller_history_and_assigns_session() {
        let app = app(Some(Canned::CountMessages), None);
        let body = json!({
            "message": "Sou contadora",
            "history": [
                { "role": "user", "parts": [{ "text": "oi" }] },
                { "role": "model", "parts": [{ "text": "Qual seu nome?" }] },
                { "role": "user", "text": "Ana" },
                { "role": "assistant", "text": "O que você faz?" },
            ],
        });
        let response = app.oneshot(post_json("/api/chat", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "5 messages");
        assert_eq!(body["isRetrato"], false);
        assert!(body["retratoData"].is_null());
        assert_eq!(body["model"], "primary");
        assert!(body["sessionId"].as_str().unwrap().starts_with("session_"));
    }

    #[tokio::test]
    async fn test_chat_server_history_accumulates() {
        let app = app(Some(Canned::CountMessages), None);

        let first = app
            .clone()
            .oneshot(post_json("/api/chat", json!({ "message": "oi", "sessionId": "s1" })))
            .await
            .unwrap();
        assert_eq!(body_json(first).await["response"], "1 messages");

        let second = app
            .oneshot(post_json("/api/chat", json!({ "message": "Ana", "sessionId": "s1" })))
            .await
            .unwrap();
        let body = body_json(second).await;
        assert_eq!(body["response"], "3 messages");
        assert_eq!(body["sessionId"], "s1");
    }

    #[tokio::test]
    async fn test_chat_returns_portrait() {
        let app = app(Some(Canned::Text(PORTRAIT_REPLY)), None);
        let response = app
            .oneshot(post_json("/api/chat", json!({ "message": "pode gerar", "sessionId": "s1" })))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["isRetrato"], true);
        assert_eq!(body["retratoData"]["nome"], "Ana");
        assert_eq!(body["retratoData"]["profissao"], "Contadora");
    }

    #[tokio::test]
    async fn test_chat_falls_back_to_secondary() {
        let app = app(Some(Canned::Down), Some(Canned::Text("Olá da reserva")));
        let response = app
            .clone()
            .oneshot(post_json("/api/chat", json!({ "message": "oi", "sessionId": "s1" })))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["response"], "Olá da reserva");
        assert_eq!(body["model"], "secondary");

        let health = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(health).await["primaryEnabled"], false);
    }

    #[tokio::test]
    async fn test_chat_all_providers_down_is_500() {
        let app = app(Some(Canned::Down), None);
        let response = app
            .oneshot(post_json("/api/chat", json!({ "message": "oi", "sessionId": "s1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Erro no processamento");
        assert!(body["details"].as_str().unwrap().contains("canned is down"));
        assert!(body["hint"].is_string());
    }

    #[tokio::test]
    async fn test_start_returns_greeting() {
        let app = app(None, Some(Canned::Text("Oi! Eu sou a Samantha.")));
        let response = app
            .oneshot(post_json("/api/start", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Oi! Eu sou a Samantha.");
        assert_eq!(body["model"], "secondary");
        assert!(body["sessionId"].as_str().unwrap().starts_with("session_"));
    }

    #[tokio::test]
    async fn test_start_without_providers_is_500() {
        let app = app(None, None);
        let response = app
            .oneshot(post_json("/api/start", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Falha ao iniciar chat");
    }

    #[tokio::test]
    async fn test_static_index_served_at_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samantha-chat.html"), "<h1>Samantha</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let mut config = RetratoConfig::default();
        config.server.static_dir = dir.path().to_path_buf();
        let app = app_with(Some(Canned::CountMessages), None, &config);

        let root = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(root.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(root.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Samantha</h1>");

        let asset = app
            .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(asset.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let app = app(Some(Canned::CountMessages), None);
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/chat")
                    .header("origin", "https://example.com")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
