//! The exam session: one owned state machine per process.
//!
//! ```text
//! Idle --begin_generation--> Generating --finish_generation(ok)--> Answering
//!                                      \--finish_generation(err)--> Idle
//! Answering --begin_submission--> Grading --finish_grading--> Reviewed
//! Answering | Reviewed --restart--> Idle
//! Generating | Grading --abort_busy--> Idle
//! ```
//!
//! `Generating` and `Grading` are busy phases: an LLM call is outstanding and
//! every other transition is refused. Nothing in here performs I/O.

use std::fmt;

use serde::Serialize;

use crate::domain::{AnswerSet, ExamConfig, QuestionSet, NO_ANSWER};
use crate::error::ExamError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Idle,
  Generating,
  Answering,
  Grading,
  Reviewed,
}

impl Phase {
  pub fn is_busy(self) -> bool {
    matches!(self, Phase::Generating | Phase::Grading)
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Phase::Idle => "idle",
      Phase::Generating => "generating",
      Phase::Answering => "answering",
      Phase::Grading => "grading",
      Phase::Reviewed => "reviewed",
    })
  }
}

/// Everything the grader needs, detached from the session so no lock is held
/// while the model is thinking.
#[derive(Clone, Debug)]
pub struct GradingJob {
  pub config: ExamConfig,
  pub model: String,
  pub questions: QuestionSet,
  pub answers: AnswerSet,
}

/// Result of grading, written back into the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeOutcome {
  pub score: u32,
  pub total_marks: u32,
  pub feedback: String,
}

#[derive(Debug, Default)]
pub struct ExamSession {
  phase: Phase,
  config: Option<ExamConfig>,
  model: Option<String>,
  questions: Option<QuestionSet>,
  answers: AnswerSet,
  score: u32,
  total_marks: u32,
  feedback: Option<String>,
}

impl ExamSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn phase(&self) -> Phase { self.phase }
  pub fn config(&self) -> Option<&ExamConfig> { self.config.as_ref() }
  pub fn model(&self) -> Option<&str> { self.model.as_deref() }
  pub fn questions(&self) -> Option<&QuestionSet> { self.questions.as_ref() }
  pub fn answers(&self) -> &AnswerSet { &self.answers }
  pub fn score(&self) -> u32 { self.score }
  pub fn total_marks(&self) -> u32 { self.total_marks }
  pub fn feedback(&self) -> Option<&str> { self.feedback.as_deref() }

  fn guard(&self, action: &'static str, allowed: &[Phase]) -> Result<(), ExamError> {
    if allowed.contains(&self.phase) {
      Ok(())
    } else if self.phase.is_busy() {
      Err(ExamError::Busy(self.phase))
    } else {
      Err(ExamError::InvalidTransition { action, phase: self.phase })
    }
  }

  fn clear(&mut self) {
    *self = Self::default();
  }

  /// `Idle -> Generating`. Validates the config and clears any previous results.
  pub fn begin_generation(&mut self, config: ExamConfig, model: String) -> Result<(), ExamError> {
    self.guard("generate a test", &[Phase::Idle])?;
    config.validate()?;
    self.clear();
    self.config = Some(config);
    self.model = Some(model);
    self.phase = Phase::Generating;
    Ok(())
  }

  /// `Generating -> Answering` on success; back to a clean `Idle` on failure.
  pub fn finish_generation(&mut self, result: Result<QuestionSet, ExamError>) -> Result<(), ExamError> {
    self.guard("store generated questions", &[Phase::Generating])?;
    match result {
      Ok(questions) => {
        self.questions = Some(questions);
        self.phase = Phase::Answering;
        Ok(())
      }
      Err(e) => {
        self.clear();
        Err(e)
      }
    }
  }

  /// `Answering -> Grading`.
  ///
  /// Only answers to known question ids are recorded. MCQ tests must be fully
  /// answered; descriptive blanks are recorded as "No Answer".
  ///
  /// An incomplete MCQ submission returns `ValidationFailed` and the phase stays
  /// `Answering`, but the answers given so far replace the stored ones so the
  /// form can be shown again with them filled in. That is the only state a
  /// rejected submission touches.
  pub fn begin_submission(&mut self, submitted: AnswerSet) -> Result<GradingJob, ExamError> {
    self.guard("submit answers", &[Phase::Answering])?;
    let (Some(config), Some(model), Some(questions)) = (&self.config, &self.model, &self.questions) else {
      return Err(ExamError::Internal("answering phase without a test".into()));
    };

    let mut answers = AnswerSet::new();
    let mut missing = 0usize;
    for key in questions.answer_keys() {
      // Values are stored verbatim; MCQ grading compares them exactly.
      let value = submitted.get(&key).filter(|v| !v.trim().is_empty()).cloned();
      match (value, questions) {
        (Some(v), _) => { answers.insert(key, v); }
        (None, QuestionSet::Mcq(_)) => missing += 1,
        (None, QuestionSet::Descriptive(_)) => { answers.insert(key, NO_ANSWER.to_string()); }
      }
    }

    let job = GradingJob {
      config: config.clone(),
      model: model.clone(),
      questions: questions.clone(),
      answers: answers.clone(),
    };
    self.answers = answers;

    if missing > 0 {
      return Err(ExamError::ValidationFailed("Please answer all questions before submitting.".into()));
    }
    self.phase = Phase::Grading;
    Ok(job)
  }

  /// `Grading -> Reviewed`.
  pub fn finish_grading(&mut self, outcome: GradeOutcome) -> Result<(), ExamError> {
    self.guard("store grading results", &[Phase::Grading])?;
    self.score = outcome.score;
    self.total_marks = outcome.total_marks;
    self.feedback = Some(outcome.feedback);
    self.phase = Phase::Reviewed;
    Ok(())
  }

  /// Back to `Idle` from a busy phase whose task died before finishing it.
  /// Returns `false` (and changes nothing) when the session is not busy.
  pub fn abort_busy(&mut self) -> bool {
    if !self.phase.is_busy() {
      return false;
    }
    self.clear();
    true
  }

  /// Back to `Idle`, dropping questions, answers, score and feedback.
  pub fn restart(&mut self) -> Result<(), ExamError> {
    self.guard("start a new test", &[Phase::Idle, Phase::Answering, Phase::Reviewed])?;
    self.clear();
    Ok(())
  }
}
