//! Domain models: exam configuration, question variants and answers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::util::sanitize_free_text;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 20;

/// Curriculum authority used as exam context.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Board {
  #[serde(rename = "CBSE")]
  Cbse,
  #[serde(rename = "ICSE")]
  Icse,
  #[serde(rename = "IGCSE")]
  Igcse,
  #[serde(rename = "State Board", alias = "StateBoard")]
  StateBoard,
  Other,
}

impl fmt::Display for Board {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Board::Cbse => "CBSE",
      Board::Icse => "ICSE",
      Board::Igcse => "IGCSE",
      Board::StateBoard => "State Board",
      Board::Other => "Other",
    })
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Difficulty::Easy => "Easy",
      Difficulty::Medium => "Medium",
      Difficulty::Hard => "Hard",
    })
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
  #[serde(rename = "MCQ")]
  Mcq,
  Descriptive,
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      QuestionType::Mcq => "MCQ",
      QuestionType::Descriptive => "Descriptive",
    })
  }
}

/// Parameters of one mock test, as chosen on the configuration form.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
  pub board: Board,
  pub class_name: String,
  pub subject: String,
  pub chapter: String,
  pub difficulty: Difficulty,
  pub count: u32,
  pub question_type: QuestionType,
}

impl ExamConfig {
  /// Generation is only allowed with a subject and chapter that survive
  /// sanitization and a count inside the supported range.
  pub fn validate(&self) -> Result<(), ExamError> {
    if sanitize_free_text(&self.subject).is_empty() || sanitize_free_text(&self.chapter).is_empty() {
      return Err(ExamError::ValidationFailed("Please enter Subject and Chapter details.".into()));
    }
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.count) {
      return Err(ExamError::ValidationFailed(format!(
        "Question count must be between {} and {}.",
        MIN_QUESTIONS, MAX_QUESTIONS
      )));
    }
    Ok(())
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct McqQuestion {
  pub id: u32,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptiveQuestion {
  pub id: u32,
  pub text: String,
  pub marks: u32,
}

/// A generated test. One variant per question type so a test never mixes kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionSet {
  Mcq(Vec<McqQuestion>),
  Descriptive(Vec<DescriptiveQuestion>),
}

impl QuestionSet {
  pub fn len(&self) -> usize {
    match self {
      QuestionSet::Mcq(qs) => qs.len(),
      QuestionSet::Descriptive(qs) => qs.len(),
    }
  }

  pub fn question_type(&self) -> QuestionType {
    match self {
      QuestionSet::Mcq(_) => QuestionType::Mcq,
      QuestionSet::Descriptive(_) => QuestionType::Descriptive,
    }
  }

  /// Question ids as the string keys used in an `AnswerSet`.
  pub fn answer_keys(&self) -> Vec<String> {
    match self {
      QuestionSet::Mcq(qs) => qs.iter().map(|q| q.id.to_string()).collect(),
      QuestionSet::Descriptive(qs) => qs.iter().map(|q| q.id.to_string()).collect(),
    }
  }
}

/// Question id (as string) -> submitted value.
pub type AnswerSet = BTreeMap<String, String>;

/// Recorded for descriptive questions left blank.
pub const NO_ANSWER: &str = "No Answer";
