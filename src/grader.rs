//! Grading: local MCQ scoring plus LLM feedback, or LLM-only descriptive grading.
//!
//! Grading never fails from the caller's point of view. If the model call
//! errors, the error text becomes the feedback the student sees.

use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{AnswerSet, DescriptiveQuestion, McqQuestion, QuestionSet, NO_ANSWER};
use crate::llm::{ChatBackend, ChatMessage};
use crate::prompt::{
  descriptive_answer_log, descriptive_grading_prompt, mcq_feedback_prompt, Mistake,
  DESCRIPTIVE_GRADING_TEMPERATURE, MCQ_FEEDBACK_TEMPERATURE,
};
use crate::session::{GradeOutcome, GradingJob};

/// Exact-match MCQ score and the list of wrong answers.
/// No case folding or trimming: "Paris" and "paris" differ.
pub fn score_mcq(questions: &[McqQuestion], answers: &AnswerSet) -> (u32, Vec<Mistake>) {
  let mut score = 0;
  let mut mistakes = Vec::new();
  for q in questions {
    let given = answers.get(&q.id.to_string());
    if given == Some(&q.correct_answer) {
      score += 1;
    } else {
      mistakes.push(Mistake {
        question: q.text.clone(),
        student_answer: given.cloned().unwrap_or_else(|| NO_ANSWER.to_string()),
        correct_answer: q.correct_answer.clone(),
      });
    }
  }
  (score, mistakes)
}

/// Sum of marks across a descriptive test. Saturates, since lenient parsing
/// lets the model pick any `u32`.
pub fn total_marks(questions: &[DescriptiveQuestion]) -> u32 {
  questions.iter().fold(0u32, |acc, q| acc.saturating_add(q.marks))
}

#[instrument(level = "info", skip_all, fields(model = %job.model, questions = job.questions.len()))]
pub async fn grade(backend: &dyn ChatBackend, prompts: &Prompts, job: &GradingJob) -> GradeOutcome {
  match &job.questions {
    QuestionSet::Mcq(qs) => grade_mcq(backend, prompts, job, qs).await,
    QuestionSet::Descriptive(qs) => grade_descriptive(backend, prompts, job, qs).await,
  }
}

async fn grade_mcq(
  backend: &dyn ChatBackend,
  prompts: &Prompts,
  job: &GradingJob,
  questions: &[McqQuestion],
) -> GradeOutcome {
  let (score, mistakes) = score_mcq(questions, &job.answers);
  let total = questions.len() as u32;
  info!(target: "exam", score, total, "MCQ scored locally");

  if score == total {
    return GradeOutcome { score, total_marks: total, feedback: prompts.perfect_score_message.clone() };
  }

  let prompt = mcq_feedback_prompt(prompts, &job.config, score, total, &mistakes);
  let feedback = match backend
    .chat(&job.model, &[ChatMessage::user(prompt)], MCQ_FEEDBACK_TEMPERATURE)
    .await
  {
    Ok(text) => text,
    Err(e) => {
      error!(target: "exam", error = %e, "MCQ feedback call failed");
      format!("Error analyzing performance: {}", e)
    }
  };
  GradeOutcome { score, total_marks: total, feedback }
}

async fn grade_descriptive(
  backend: &dyn ChatBackend,
  prompts: &Prompts,
  job: &GradingJob,
  questions: &[DescriptiveQuestion],
) -> GradeOutcome {
  let total = total_marks(questions);
  let log = descriptive_answer_log(questions.iter().map(|q| {
    let answer = job.answers.get(&q.id.to_string()).map(String::as_str).unwrap_or(NO_ANSWER);
    (q, answer)
  }));
  let prompt = descriptive_grading_prompt(prompts, &job.config, log, total);

  let feedback = match backend
    .chat(&job.model, &[ChatMessage::user(prompt)], DESCRIPTIVE_GRADING_TEMPERATURE)
    .await
  {
    Ok(text) => text,
    Err(e) => {
      error!(target: "exam", error = %e, "Descriptive grading call failed");
      format!("Error grading descriptive answers: {}", e)
    }
  };
  // The awarded score lives only in the narrative; it is not read back.
  GradeOutcome { score: 0, total_marks: total, feedback }
}
