//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - Static SPA from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers); tighten for public deployments
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/status", get(http::http_get_status))
        .route("/api/v1/session", get(http::http_get_session))
        .route("/api/v1/session/generate", post(http::http_post_generate))
        .route("/api/v1/session/submit", post(http::http_post_submit))
        .route("/api/v1/session/restart", post(http::http_post_restart))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Prompts, Settings};
    use crate::llm::testing::ScriptedBackend;
    use crate::llm::ChatBackend;

    const TWO_MCQ: &str = r#"[
      {"id": 1, "question": "H2O is?", "options": ["Water", "Salt", "Sugar", "Air"], "correct_answer": "Water"},
      {"id": 2, "question": "NaCl is?", "options": ["Water", "Salt", "Sugar", "Air"], "correct_answer": "Salt"}
    ]"#;

    async fn app(backend: Option<ScriptedBackend>) -> Router {
        let llm = backend.map(|b| Arc::new(b) as Arc<dyn ChatBackend>);
        let state = AppState::initialize(llm, Prompts::default(), &Settings::default()).await;
        build_router(Arc::new(state), "./static")
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn generate_body(count: u32) -> Value {
        json!({
            "config": {
                "board": "CBSE",
                "className": "6",
                "subject": "Chemistry",
                "chapter": "Matter",
                "difficulty": "Easy",
                "count": count,
                "questionType": "MCQ"
            }
        })
    }

    #[tokio::test]
    async fn status_reports_config_missing() {
        let app = app(None).await;
        let (status, body) = call(&app, "GET", "/api/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configured"], false);
        assert_eq!(body["online"], false);

        let (status, body) = call(&app, "POST", "/api/v1/session/generate", Some(generate_body(2))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "config_missing");
    }

    #[tokio::test]
    async fn full_mcq_round_over_http() {
        let backend = ScriptedBackend::new(&["llama-3.3-70b"]).reply(TWO_MCQ);
        let app = app(Some(backend)).await;

        let (status, body) = call(&app, "GET", "/api/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["online"], true);
        assert_eq!(body["defaultModel"], "llama-3.3-70b");

        let (status, body) = call(&app, "POST", "/api/v1/session/generate", Some(generate_body(2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "answering");
        assert_eq!(body["questions"].as_array().unwrap().len(), 2);

        let (status, body) =
            call(&app, "POST", "/api/v1/session/submit", Some(json!({ "answers": { "1": "Water" } }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "validation_failed");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/session/submit",
            Some(json!({ "answers": { "1": "Water", "2": "Salt" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "reviewed");
        assert_eq!(body["score"], 2);
        assert_eq!(body["answerKey"][1]["correct"], true);

        let (status, body) = call(&app, "POST", "/api/v1/session/restart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "idle");
    }

    #[tokio::test]
    async fn out_of_range_count_is_unprocessable() {
        let backend = ScriptedBackend::new(&["m"]);
        let app = app(Some(backend)).await;
        let (status, body) = call(&app, "POST", "/api/v1/session/generate", Some(generate_body(25))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "validation_failed");
    }

    #[tokio::test]
    async fn submit_without_a_test_conflicts() {
        let backend = ScriptedBackend::new(&["m"]);
        let app = app(Some(backend)).await;
        let (status, body) = call(&app, "POST", "/api/v1/session/submit", Some(json!({ "answers": {} }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "invalid_transition");
    }
}
