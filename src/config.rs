//! Runtime settings (environment) and prompt templates (optional TOML).
//!
//! See `Settings` for the environment variables and `ExamFileConfig` /
//! `Prompts` for the TOML schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_PREFERRED_MODEL: &str = "llama-3.3";
pub const DEFAULT_PORT: u16 = 3000;

/// Process settings read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  /// `None` means the service runs in "config missing" mode.
  pub api_key: Option<String>,
  pub base_url: String,
  /// Substring used to pick the default model from the listing.
  pub preferred_model: String,
  pub timeout: Option<Duration>,
  pub strict_validation: bool,
  pub port: u16,
  pub static_dir: String,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.into(),
      preferred_model: DEFAULT_PREFERRED_MODEL.into(),
      timeout: None,
      strict_validation: true,
      port: DEFAULT_PORT,
      static_dir: "./static".into(),
    }
  }
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Build settings from any key lookup; unparsable values fall back to defaults.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = Self::default();
    let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_key = non_empty("LLM_API_KEY").or_else(|| non_empty("GROQ_API_KEY"));
    let base_url = non_empty("LLM_BASE_URL")
      .map(|u| u.trim_end_matches('/').to_string())
      .unwrap_or(defaults.base_url);
    let preferred_model = non_empty("LLM_PREFERRED_MODEL").unwrap_or(defaults.preferred_model);

    let timeout = non_empty("LLM_TIMEOUT_SECS").and_then(|v| match v.parse::<u64>() {
      Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
      _ => {
        warn!(target: "mockexam_backend", value = %v, "Ignoring invalid LLM_TIMEOUT_SECS");
        None
      }
    });

    let strict_validation = match non_empty("EXAM_STRICT_VALIDATION").as_deref() {
      Some("0") | Some("false") | Some("off") | Some("no") => false,
      _ => true,
    };

    let port = non_empty("PORT")
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(defaults.port);
    let static_dir = non_empty("STATIC_DIR").unwrap_or(defaults.static_dir);

    Self { api_key, base_url, preferred_model, timeout, strict_validation, port, static_dir }
  }
}

/// Optional TOML file pointed to by `EXAM_CONFIG_PATH`.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct ExamFileConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompt templates. Placeholders in `{braces}` are filled by the prompt builder.
/// Any subset can be overridden in TOML; missing keys keep their defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Generation
  pub generation_system: String,
  pub generation_context_template: String,
  pub mcq_generation_template: String,
  pub descriptive_generation_template: String,
  // Grading
  pub mcq_feedback_template: String,
  pub descriptive_grading_template: String,
  pub perfect_score_message: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generation_system: "You are a precise academic assistant. You do not hallucinate facts. You output strictly valid JSON.".into(),
      generation_context_template: concat!(
        "You are a strict Textbook Author and Examiner for the {board} Board. ",
        "Subject: {subject}, Class: {class}, Chapter: '{chapter}'.\n",
        "CRITICAL RULES:\n",
        "1. Questions must be factually 100% correct according to standard {board} textbooks.\n",
        "2. Avoid ambiguous questions. There must be exactly one indisputable correct answer.\n",
        "3. Use questions from Past Year Papers where possible.\n",
      ).into(),
      mcq_generation_template: r#"{context}
Create a strictly valid JSON list of exactly {count} {difficulty}-level Multiple Choice Questions (MCQs).

JSON Format:
[
    {
        "id": 1,
        "question": "Question text?",
        "options": ["Option A", "Option B", "Option C", "Option D"],
        "correct_answer": "Option A"
    }
]
VERIFICATION STEP: Before outputting, check that 'correct_answer' matches one of the 'options' exactly and is factually true.
Return ONLY raw JSON."#.into(),
      descriptive_generation_template: r#"{context}
Create a strictly valid JSON list of {count} {difficulty}-level Descriptive Questions.
Include 'marks' (e.g., 2, 3, 5).

JSON Format:
[
    {
        "id": 1,
        "question": "Question text?",
        "marks": 3
    }
]
Return ONLY raw JSON."#.into(),
      mcq_feedback_template: r#"The student scored {score}/{total} in a {board} Class {class} {subject} MCQ test.
Mistakes:
{mistakes}
Provide a "Scope for Improvement" analysis.
Explain clearly WHY the student's answer was wrong and why the correct answer is correct."#.into(),
      descriptive_grading_template: r#"You are a strict examiner for {board} Class {class} {subject}.
Evaluate these descriptive answers based on standard Board marking schemes.

Data:
{answers}
Output Requirements:
1. Award marks for EACH question.
2. Calculate Total Score obtained out of {total}.
3. Provide "Scope for Improvement" pointing out missing keywords or concepts.
4. Format clearly in Markdown."#.into(),
      perfect_score_message: "### Excellent! Perfect Score. \nYou have mastered this topic based on Board standards.".into(),
    }
  }
}

/// Attempt to load prompts from EXAM_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_exam_config_from_env() -> Option<ExamFileConfig> {
  let path = std::env::var("EXAM_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ExamFileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "mockexam_backend", %path, "Loaded exam config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mockexam_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mockexam_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
