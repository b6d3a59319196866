//! Response parser: model text -> typed `QuestionSet`.
//!
//! The model is untrusted. Decoding is all-or-nothing: any element that does not
//! fit the requested variant rejects the whole response. Strict mode additionally
//! checks the invariants the prompt asks the model to self-check.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{DescriptiveQuestion, McqQuestion, QuestionSet, QuestionType};
use crate::util::strip_code_fences;

pub const MCQ_OPTION_COUNT: usize = 4;
pub const MAX_MARKS: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("malformed response: {0}")]
  MalformedResponse(String),
  #[error("malformed response: expected a JSON array of questions")]
  NotAnArray,
  #[error("model returned no questions")]
  Empty,
  #[error("question #{index} has an unexpected shape: {reason}")]
  Shape { index: usize, reason: String },
  #[error("expected {expected} questions, model returned {actual}")]
  CountMismatch { expected: usize, actual: usize },
  #[error("question id {0} is not a positive unique id")]
  BadId(u32),
  #[error("question {id} has {count} options, expected 4")]
  OptionCount { id: u32, count: usize },
  #[error("question {id}: correct answer is not one of its options")]
  DanglingAnswer { id: u32 },
  #[error("question {id} is worth {marks} marks, expected 1 to 100")]
  MarksOutOfRange { id: u32, marks: u32 },
}

#[derive(Deserialize)]
struct RawMcq {
  id: u32,
  question: String,
  options: Vec<String>,
  correct_answer: String,
}

#[derive(Deserialize)]
struct RawDescriptive {
  id: u32,
  question: String,
  #[serde(default = "default_marks")]
  marks: u32,
}

fn default_marks() -> u32 { 1 }

/// Strip fences and decode the top-level JSON array.
pub fn decode_array(raw: &str) -> Result<Vec<Value>, ParseError> {
  let cleaned = strip_code_fences(raw);
  let value: Value =
    serde_json::from_str(&cleaned).map_err(|e| ParseError::MalformedResponse(e.to_string()))?;
  match value {
    Value::Array(items) => Ok(items),
    _ => Err(ParseError::NotAnArray),
  }
}

fn decode_items<T: for<'a> Deserialize<'a>>(items: Vec<Value>) -> Result<Vec<T>, ParseError> {
  items
    .into_iter()
    .enumerate()
    .map(|(i, v)| serde_json::from_value::<T>(v).map_err(|e| ParseError::Shape { index: i + 1, reason: e.to_string() }))
    .collect()
}

/// Parse a generation response for the requested question type.
///
/// With `strict`, `expected_count` must match and every question must satisfy
/// its invariants (unique positive ids, four options containing the answer,
/// marks between 1 and `MAX_MARKS`).
pub fn parse_questions(
  raw: &str,
  question_type: QuestionType,
  expected_count: usize,
  strict: bool,
) -> Result<QuestionSet, ParseError> {
  let items = decode_array(raw)?;
  if items.is_empty() {
    return Err(ParseError::Empty);
  }
  if strict && items.len() != expected_count {
    return Err(ParseError::CountMismatch { expected: expected_count, actual: items.len() });
  }

  let set = match question_type {
    QuestionType::Mcq => QuestionSet::Mcq(
      decode_items::<RawMcq>(items)?
        .into_iter()
        .map(|r| McqQuestion { id: r.id, text: r.question, options: r.options, correct_answer: r.correct_answer })
        .collect(),
    ),
    QuestionType::Descriptive => QuestionSet::Descriptive(
      decode_items::<RawDescriptive>(items)?
        .into_iter()
        .map(|r| DescriptiveQuestion { id: r.id, text: r.question, marks: r.marks })
        .collect(),
    ),
  };

  if strict {
    validate(&set)?;
  }
  Ok(set)
}

fn check_ids(ids: impl Iterator<Item = u32>) -> Result<(), ParseError> {
  let mut seen = HashSet::new();
  for id in ids {
    if id == 0 || !seen.insert(id) {
      return Err(ParseError::BadId(id));
    }
  }
  Ok(())
}

/// Invariants the prompt asks the model to respect.
pub fn validate(set: &QuestionSet) -> Result<(), ParseError> {
  match set {
    QuestionSet::Mcq(qs) => {
      check_ids(qs.iter().map(|q| q.id))?;
      for q in qs {
        if q.options.len() != MCQ_OPTION_COUNT {
          return Err(ParseError::OptionCount { id: q.id, count: q.options.len() });
        }
        if !q.options.iter().any(|o| o == &q.correct_answer) {
          return Err(ParseError::DanglingAnswer { id: q.id });
        }
      }
    }
    QuestionSet::Descriptive(qs) => {
      check_ids(qs.iter().map(|q| q.id))?;
      if let Some(q) = qs.iter().find(|q| !(1..=MAX_MARKS).contains(&q.marks)) {
        return Err(ParseError::MarksOutOfRange { id: q.id, marks: q.marks });
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MCQ_TWO: &str = r#"```json
[
  {"id": 1, "question": "2+2?", "options": ["3", "4", "5", "6"], "correct_answer": "4"},
  {"id": 2, "question": "Capital of France?", "options": ["Paris", "Rome", "Oslo", "Bern"], "correct_answer": "Paris"}
]
```"#;

  #[test]
  fn fenced_mcq_array_is_decoded() {
    let set = parse_questions(MCQ_TWO, QuestionType::Mcq, 2, true).unwrap();
    match set {
      QuestionSet::Mcq(qs) => {
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[1].text, "Capital of France?");
        assert_eq!(qs[1].correct_answer, "Paris");
      }
      other => panic!("unexpected variant: {other:?}"),
    }
  }

  #[test]
  fn prose_is_a_malformed_response() {
    let err = parse_questions("Sure! Here are your questions.", QuestionType::Mcq, 1, true).unwrap_err();
    assert!(matches!(err, ParseError::MalformedResponse(_)));
  }

  #[test]
  fn object_instead_of_array_is_rejected() {
    let err = parse_questions(r#"{"questions": []}"#, QuestionType::Mcq, 1, false).unwrap_err();
    assert_eq!(err, ParseError::NotAnArray);
  }

  #[test]
  fn empty_array_is_rejected_even_when_lenient() {
    assert_eq!(parse_questions("[]", QuestionType::Descriptive, 1, false).unwrap_err(), ParseError::Empty);
  }

  #[test]
  fn missing_field_rejects_whole_response() {
    let raw = r#"[{"id": 1, "question": "q", "options": ["a","b","c","d"]}]"#;
    let err = parse_questions(raw, QuestionType::Mcq, 1, false).unwrap_err();
    assert!(matches!(err, ParseError::Shape { index: 1, .. }));
  }

  #[test]
  fn descriptive_marks_default_to_one() {
    let raw = r#"[{"id": 1, "question": "Explain refraction."}, {"id": 2, "question": "Define lens.", "marks": 3}]"#;
    match parse_questions(raw, QuestionType::Descriptive, 2, true).unwrap() {
      QuestionSet::Descriptive(qs) => {
        assert_eq!(qs[0].marks, 1);
        assert_eq!(qs[1].marks, 3);
      }
      other => panic!("unexpected variant: {other:?}"),
    }
  }

  #[test]
  fn strict_mode_rejects_dangling_answer() {
    let raw = r#"[{"id": 1, "question": "q", "options": ["a","b","c","d"], "correct_answer": "e"}]"#;
    assert_eq!(
      parse_questions(raw, QuestionType::Mcq, 1, true).unwrap_err(),
      ParseError::DanglingAnswer { id: 1 }
    );
    assert!(parse_questions(raw, QuestionType::Mcq, 1, false).is_ok());
  }

  #[test]
  fn strict_mode_rejects_duplicate_ids_and_wrong_counts() {
    let raw = r#"[{"id": 1, "question": "a", "marks": 2}, {"id": 1, "question": "b", "marks": 2}]"#;
    assert_eq!(parse_questions(raw, QuestionType::Descriptive, 2, true).unwrap_err(), ParseError::BadId(1));
    assert_eq!(
      parse_questions(raw, QuestionType::Descriptive, 3, true).unwrap_err(),
      ParseError::CountMismatch { expected: 3, actual: 2 }
    );
  }

  #[test]
  fn strict_mode_requires_four_options() {
    let raw = r#"[{"id": 1, "question": "q", "options": ["a","b"], "correct_answer": "a"}]"#;
    assert_eq!(
      parse_questions(raw, QuestionType::Mcq, 1, true).unwrap_err(),
      ParseError::OptionCount { id: 1, count: 2 }
    );
  }

  #[test]
  fn strict_mode_bounds_marks() {
    let huge = r#"[{"id": 1, "question": "a", "marks": 4294967295}, {"id": 2, "question": "b", "marks": 2}]"#;
    assert_eq!(
      parse_questions(huge, QuestionType::Descriptive, 2, true).unwrap_err(),
      ParseError::MarksOutOfRange { id: 1, marks: u32::MAX }
    );
    let zero = r#"[{"id": 1, "question": "a", "marks": 0}]"#;
    assert_eq!(
      parse_questions(zero, QuestionType::Descriptive, 1, true).unwrap_err(),
      ParseError::MarksOutOfRange { id: 1, marks: 0 }
    );
    let max = r#"[{"id": 1, "question": "a", "marks": 100}]"#;
    assert!(parse_questions(max, QuestionType::Descriptive, 1, true).is_ok());
  }
}
