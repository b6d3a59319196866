//! Mock Exam · LLM-backed test generator backend
//!
//! - Axum HTTP API driving a single exam session (configure → answer → review)
//! - OpenAI-compatible LLM integration (Groq by default) for authoring and grading
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                   : u16 (default 3000)
//!   LLM_API_KEY            : required; GROQ_API_KEY is accepted as a fallback
//!   LLM_BASE_URL           : default "https://api.groq.com/openai/v1"
//!   LLM_PREFERRED_MODEL    : substring picking the default model (default "llama-3.3")
//!   LLM_TIMEOUT_SECS       : optional HTTP timeout for LLM calls
//!   EXAM_STRICT_VALIDATION : "false" to accept any well-formed JSON from the model
//!   EXAM_CONFIG_PATH       : path to TOML config (prompt overrides)
//!   STATIC_DIR             : frontend directory (default "./static")
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod config;
mod domain;
mod error;
mod exam;
mod grader;
mod llm;
mod parser;
mod prompt;
mod protocol;
mod routes;
mod session;
mod state;
mod telemetry;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Settings;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();

  // Shared state: the exam session, LLM client, prompts, cached model list.
  let state = Arc::new(AppState::from_env(&settings).await);
  if !state.online() {
    warn!(target: "mockexam_backend", configured = state.configured(), "Starting offline; test generation is disabled");
  }

  let app = build_router(state.clone(), &settings.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "mockexam_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "mockexam_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "mockexam_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "mockexam_backend", "Shutdown signal received");
}
