//! HTTP endpoint handlers. These are thin wrappers that forward to the exam workflow.
//! Each handler is instrumented and logs parameters and basic result info.

use std::{future::Future, sync::Arc};

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{error, info, instrument};

use crate::error::ExamError;
use crate::exam;
use crate::protocol::*;
use crate::state::AppState;

/// Run a session action on its own task so a dropped connection cannot leave
/// the session stuck in a busy phase. If the task itself dies, the busy phase
/// it left behind is dropped so the session can be restarted.
async fn run_detached<F>(state: &AppState, fut: F) -> Result<SessionOut, ExamError>
where
  F: Future<Output = Result<SessionOut, ExamError>> + Send + 'static,
{
  match tokio::spawn(fut).await {
    Ok(result) => result,
    Err(e) => {
      let reset = state.session.write().await.abort_busy();
      error!(target: "mockexam_backend", error = %e, reset, "Session task aborted");
      Err(ExamError::Internal(e.to_string()))
    }
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let phase = state.session.read().await.phase();
  Json(StatusOut {
    configured: state.configured(),
    online: state.online(),
    models: state.models.as_ref().clone(),
    default_model: state.default_model.clone(),
    phase,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(exam::snapshot(&state).await)
}

#[instrument(
  level = "info",
  skip(state, body),
  fields(subject_len = body.config.subject.len(), count = body.config.count, model = ?body.model)
)]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<SessionOut>, ExamError> {
  let task_state = state.clone();
  let out = run_detached(&state, async move { exam::generate(&task_state, body.config, body.model).await }).await?;
  info!(target: "exam", questions = out.questions.len(), "HTTP generate served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(answers = body.answers.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SessionOut>, ExamError> {
  let task_state = state.clone();
  let out = run_detached(&state, async move { exam::submit(&task_state, body.answers).await }).await?;
  info!(target: "exam", score = ?out.score, total_marks = out.total_marks, "HTTP submit graded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_restart(State(state): State<Arc<AppState>>) -> Result<Json<SessionOut>, ExamError> {
  Ok(Json(exam::restart(&state).await?))
}
