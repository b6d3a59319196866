//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSet, ExamConfig, QuestionSet, QuestionType};
use crate::session::{ExamSession, Phase};

//
// Requests
//

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub config: ExamConfig,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    #[serde(default)]
    pub answers: AnswerSet,
}

//
// Responses
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOut {
    /// API key present.
    pub configured: bool,
    /// Model list available; generation enabled.
    pub online: bool,
    pub models: Vec<String>,
    pub default_model: Option<String>,
    pub phase: Phase,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub kind: &'static str,
    pub message: String,
}

/// A question as shown on the answer form. Never carries the correct answer.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<u32>,
}

/// One row of the MCQ answer key, only present once the test is reviewed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKeyOut {
    pub id: u32,
    pub question: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub phase: Phase,
    pub config: Option<ExamConfig>,
    pub model: Option<String>,
    pub question_type: Option<QuestionType>,
    pub questions: Vec<QuestionOut>,
    pub answers: AnswerSet,
    /// MCQ only; descriptive scores stay in the feedback narrative.
    pub score: Option<u32>,
    pub total_marks: u32,
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<Vec<AnswerKeyOut>>,
}

/// Convert the session (internal) into the public view for its current phase.
pub fn session_out(s: &ExamSession) -> SessionOut {
    let reviewed = s.phase() == Phase::Reviewed;

    let questions = match s.questions() {
        Some(QuestionSet::Mcq(qs)) => qs
            .iter()
            .map(|q| QuestionOut { id: q.id, text: q.text.clone(), options: Some(q.options.clone()), marks: None })
            .collect(),
        Some(QuestionSet::Descriptive(qs)) => qs
            .iter()
            .map(|q| QuestionOut { id: q.id, text: q.text.clone(), options: None, marks: Some(q.marks) })
            .collect(),
        None => Vec::new(),
    };

    let answer_key = match s.questions() {
        Some(QuestionSet::Mcq(qs)) if reviewed => Some(
            qs.iter()
                .map(|q| {
                    let your_answer = s.answers().get(&q.id.to_string()).cloned();
                    AnswerKeyOut {
                        id: q.id,
                        question: q.text.clone(),
                        correct: your_answer.as_deref() == Some(q.correct_answer.as_str()),
                        your_answer,
                        correct_answer: q.correct_answer.clone(),
                    }
                })
                .collect(),
        ),
        _ => None,
    };

    let question_type = s.questions().map(QuestionSet::question_type);
    let score = match question_type {
        Some(QuestionType::Mcq) if reviewed => Some(s.score()),
        _ => None,
    };

    SessionOut {
        phase: s.phase(),
        config: s.config().cloned(),
        model: s.model().map(str::to_string),
        question_type,
        questions,
        answers: s.answers().clone(),
        score,
        total_marks: s.total_marks(),
        feedback: s.feedback().map(str::to_string),
        answer_key,
    }
}
