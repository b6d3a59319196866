//! Prompt builder: deterministic instruction strings for generation and grading.
//!
//! Free-text fields (subject, chapter, class) are sanitized to printable ASCII
//! before they are interpolated.

use crate::config::Prompts;
use crate::domain::{DescriptiveQuestion, ExamConfig, QuestionType};
use crate::llm::ChatMessage;
use crate::util::{fill_template, sanitize_free_text};

pub const GENERATION_TEMPERATURE: f32 = 0.1;
pub const MCQ_FEEDBACK_TEMPERATURE: f32 = 0.3;
pub const DESCRIPTIVE_GRADING_TEMPERATURE: f32 = 0.2;

/// One incorrect MCQ answer, as reported to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mistake {
  pub question: String,
  pub student_answer: String,
  pub correct_answer: String,
}

fn context_pairs(config: &ExamConfig) -> [(&'static str, String); 4] {
  [
    ("board", config.board.to_string()),
    ("subject", sanitize_free_text(&config.subject)),
    ("class", sanitize_free_text(&config.class_name)),
    ("chapter", sanitize_free_text(&config.chapter)),
  ]
}

fn fill(tpl: &str, pairs: &[(&str, String)]) -> String {
  let borrowed: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
  fill_template(tpl, &borrowed)
}

/// User instruction asking for `count` questions of the configured type as raw JSON.
pub fn generation_prompt(prompts: &Prompts, config: &ExamConfig) -> String {
  let context = fill(&prompts.generation_context_template, &context_pairs(config));
  let tpl = match config.question_type {
    QuestionType::Mcq => &prompts.mcq_generation_template,
    QuestionType::Descriptive => &prompts.descriptive_generation_template,
  };
  fill(
    tpl,
    &[
      ("context", context),
      ("count", config.count.to_string()),
      ("difficulty", config.difficulty.to_string()),
    ],
  )
}

pub fn generation_messages(prompts: &Prompts, config: &ExamConfig) -> Vec<ChatMessage> {
  vec![
    ChatMessage::system(prompts.generation_system.clone()),
    ChatMessage::user(generation_prompt(prompts, config)),
  ]
}

/// Mistake log: one `Q / Student Answer / Correct Answer` block per wrong question.
pub fn mistake_log(mistakes: &[Mistake]) -> String {
  mistakes
    .iter()
    .map(|m| {
      format!(
        "Q: {}\nStudent Answer: {}\nCorrect Answer: {}\n\n",
        m.question, m.student_answer, m.correct_answer
      )
    })
    .collect()
}

pub fn mcq_feedback_prompt(
  prompts: &Prompts,
  config: &ExamConfig,
  score: u32,
  total: u32,
  mistakes: &[Mistake],
) -> String {
  let mut pairs = context_pairs(config).to_vec();
  pairs.push(("score", score.to_string()));
  pairs.push(("total", total.to_string()));
  pairs.push(("mistakes", mistake_log(mistakes)));
  fill(&prompts.mcq_feedback_template, &pairs)
}

/// Question/answer/marks data block for descriptive grading.
pub fn descriptive_answer_log<'a, I>(entries: I) -> String
where
  I: IntoIterator<Item = (&'a DescriptiveQuestion, &'a str)>,
{
  entries
    .into_iter()
    .map(|(q, answer)| format!("Q ({} marks): {}\nStudent Answer: {}\n\n", q.marks, q.text, answer))
    .collect()
}

pub fn descriptive_grading_prompt(prompts: &Prompts, config: &ExamConfig, answers: String, total: u32) -> String {
  let mut pairs = context_pairs(config).to_vec();
  pairs.push(("answers", answers));
  pairs.push(("total", total.to_string()));
  fill(&prompts.descriptive_grading_template, &pairs)
}
