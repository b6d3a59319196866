//! Exam workflow shared by the HTTP handlers.
//!
//! Each action takes the session lock only to begin and to finish its
//! transition; the LLM call in between runs unlocked while the session sits in
//! a busy phase.

use std::time::Instant;

use tracing::{debug, error, info, instrument};

use crate::domain::{AnswerSet, ExamConfig};
use crate::error::ExamError;
use crate::grader;
use crate::parser::parse_questions;
use crate::prompt::{generation_messages, GENERATION_TEMPERATURE};
use crate::protocol::{session_out, SessionOut};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn snapshot(state: &AppState) -> SessionOut {
  session_out(&*state.session.read().await)
}

/// `Idle -> Generating -> Answering` (or back to `Idle` on failure).
#[instrument(
  level = "info",
  skip(state, config, requested_model),
  fields(board = %config.board, question_type = %config.question_type, count = config.count)
)]
pub async fn generate(
  state: &AppState,
  config: ExamConfig,
  requested_model: Option<String>,
) -> Result<SessionOut, ExamError> {
  let backend = state.backend()?;
  let model = state.resolve_model(requested_model.as_deref())?;

  state.session.write().await.begin_generation(config.clone(), model.clone())?;
  info!(target: "exam", %model, difficulty = %config.difficulty, "Generating test");

  let messages = generation_messages(&state.prompts, &config);
  let start = Instant::now();
  let result = match backend.chat(&model, &messages, GENERATION_TEMPERATURE).await {
    Ok(text) => {
      let parsed = parse_questions(&text, config.question_type, config.count as usize, state.strict_validation);
      if let Err(e) = &parsed {
        debug!(target: "exam", error = %e, preview = %trunc_for_log(&text, 200), "Unusable model output");
      }
      parsed.map_err(ExamError::from)
    }
    Err(e) => Err(ExamError::from(e)),
  };
  let elapsed = start.elapsed();

  match &result {
    Ok(set) => info!(target: "exam", ?elapsed, questions = set.len(), "Test generated"),
    Err(e) => error!(target: "exam", ?elapsed, error = %e, "Test generation failed"),
  }

  let mut session = state.session.write().await;
  session.finish_generation(result)?;
  Ok(session_out(&session))
}

/// `Answering -> Grading -> Reviewed`. Incomplete MCQ submissions stay in
/// `Answering` and never reach the grader.
#[instrument(level = "info", skip(state, answers), fields(answers = answers.len()))]
pub async fn submit(state: &AppState, answers: AnswerSet) -> Result<SessionOut, ExamError> {
  let backend = state.backend()?;

  let job = state.session.write().await.begin_submission(answers)?;
  info!(target: "exam", model = %job.model, question_type = %job.questions.question_type(), "Grading submission");

  let outcome = grader::grade(backend.as_ref(), &state.prompts, &job).await;
  info!(target: "exam", score = outcome.score, total_marks = outcome.total_marks, feedback_len = outcome.feedback.len(), "Submission graded");

  let mut session = state.session.write().await;
  session.finish_grading(outcome)?;
  Ok(session_out(&session))
}

/// Back to `Idle` with an empty session.
#[instrument(level = "info", skip(state))]
pub async fn restart(state: &AppState) -> Result<SessionOut, ExamError> {
  let mut session = state.session.write().await;
  session.restart()?;
  info!(target: "exam", "Session reset");
  Ok(session_out(&session))
}
