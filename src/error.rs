//! Error taxonomy for the exam workflow and the LLM adapter.
//!
//! `ExamError` is what handlers return; it maps onto an HTTP status and a small
//! JSON body so the frontend can show the message inline next to the action
//! that triggered it. Grading failures are deliberately absent: the grader turns
//! them into feedback text.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::parser::ParseError;
use crate::protocol::ErrorOut;
use crate::session::Phase;

/// Failures of the chat-completion adapter.
#[derive(Debug, Error)]
pub enum LlmError {
  #[error("request failed: {0}")]
  Transport(String),
  #[error("LLM HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("could not decode LLM response: {0}")]
  Decode(String),
  #[error("LLM response contained no choices")]
  EmptyChoice,
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() { LlmError::Decode(e.to_string()) } else { LlmError::Transport(e.to_string()) }
  }
}

#[derive(Debug, Error)]
pub enum ExamError {
  #[error("Config Missing: set LLM_API_KEY (or GROQ_API_KEY) before starting the service.")]
  ConfigMissing,
  #[error("LLM service is offline: no models available.")]
  ModelListUnavailable,
  #[error("Error generating questions: {0}")]
  GenerationFailed(String),
  #[error("{0}")]
  ValidationFailed(String),
  #[error("Another request is still in progress ({0}).")]
  Busy(Phase),
  #[error("Cannot {action} while the exam is {phase}.")]
  InvalidTransition { action: &'static str, phase: Phase },
  #[error("internal error: {0}")]
  Internal(String),
}

impl ExamError {
  pub fn kind(&self) -> &'static str {
    match self {
      ExamError::ConfigMissing => "config_missing",
      ExamError::ModelListUnavailable => "model_list_unavailable",
      ExamError::GenerationFailed(_) => "generation_failed",
      ExamError::ValidationFailed(_) => "validation_failed",
      ExamError::Busy(_) => "busy",
      ExamError::InvalidTransition { .. } => "invalid_transition",
      ExamError::Internal(_) => "internal",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ExamError::ConfigMissing | ExamError::ModelListUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ExamError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
      ExamError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ExamError::Busy(_) | ExamError::InvalidTransition { .. } => StatusCode::CONFLICT,
      ExamError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<ParseError> for ExamError {
  fn from(e: ParseError) -> Self {
    ExamError::GenerationFailed(e.to_string())
  }
}

impl From<LlmError> for ExamError {
  fn from(e: LlmError) -> Self {
    ExamError::GenerationFailed(e.to_string())
  }
}

impl IntoResponse for ExamError {
  fn into_response(self) -> axum::response::Response {
    let body = ErrorOut { kind: self.kind(), message: self.to_string() };
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_the_taxonomy() {
    assert_eq!(ExamError::ConfigMissing.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ExamError::GenerationFailed("x".into()).status(), StatusCode::BAD_GATEWAY);
    assert_eq!(ExamError::ValidationFailed("x".into()).status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ExamError::Busy(Phase::Grading).status(), StatusCode::CONFLICT);
  }

  #[test]
  fn invalid_transition_message_names_the_phase() {
    let e = ExamError::InvalidTransition { action: "submit answers", phase: Phase::Idle };
    assert_eq!(e.to_string(), "Cannot submit answers while the exam is idle.");
  }
}
