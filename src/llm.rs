//! Minimal OpenAI-compatible client for our use-cases.
//!
//! We only call `chat/completions` (plain text back) and `models` (listing).
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Settings;
use crate::error::LlmError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: "system".into(), content: content.into() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self { role: "user".into(), content: content.into() }
  }
}

/// The seam between the exam workflow and the remote model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
  /// Send messages, return the first choice's text content.
  async fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError>;

  /// Available model ids, sorted.
  async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

#[derive(Clone)]
pub struct LlmClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
}

impl LlmClient {
  /// Construct the client if settings carry an API key; otherwise return None.
  pub fn from_settings(settings: &Settings) -> Option<Self> {
    let api_key = settings.api_key.clone()?;
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = settings.timeout {
      builder = builder.timeout(timeout);
    }
    let client = match builder.build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "mockexam_backend", error = %e, "Failed to build HTTP client");
        return None;
      }
    };
    Some(Self { client, api_key, base_url: settings.base_url.clone() })
  }

  async fn error_from_response(res: reqwest::Response) -> LlmError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let message = extract_api_error(&body).unwrap_or(body);
    LlmError::Status { status, message }
  }
}

#[async_trait]
impl ChatBackend for LlmClient {
  #[instrument(level = "info", skip(self, messages), fields(model = %model, messages = messages.len()))]
  async fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest { model, messages, temperature };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "mockexam-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let e = Self::error_from_response(res).await;
      error!(elapsed = ?start.elapsed(), error = %e, "Chat completion failed");
      return Err(e);
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| LlmError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "LLM usage");
    }
    let choice = body.choices.into_iter().next().ok_or(LlmError::EmptyChoice)?;
    let text = choice.message.content.unwrap_or_default().trim().to_string();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Chat completion received");
    Ok(text)
  }

  #[instrument(level = "info", skip(self))]
  async fn list_models(&self) -> Result<Vec<String>, LlmError> {
    let url = format!("{}/models", self.base_url);
    let res = self.client.get(&url)
      .header(USER_AGENT, "mockexam-backend/0.1")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .send().await?;

    if !res.status().is_success() {
      return Err(Self::error_from_response(res).await);
    }

    let body: ModelList = res.json().await.map_err(|e| LlmError::Decode(e.to_string()))?;
    let mut ids: Vec<String> = body.data.into_iter().map(|m| m.id).collect();
    ids.sort();
    info!(count = ids.len(), "Model list fetched");
    Ok(ids)
  }
}

/// First id containing `preferred`, else the first id.
pub fn pick_default_model(models: &[String], preferred: &str) -> Option<String> {
  models
    .iter()
    .find(|m| m.contains(preferred))
    .or_else(|| models.first())
    .cloned()
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: &'a [ChatMessage],
  temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ModelList { data: Vec<ModelEntry> }
#[derive(Deserialize)]
struct ModelEntry { id: String }

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_model_prefers_configured_substring() {
    let models = vec!["gemma-7b".to_string(), "llama-3.3-70b-versatile".to_string()];
    assert_eq!(pick_default_model(&models, "llama-3.3").as_deref(), Some("llama-3.3-70b-versatile"));
    assert_eq!(pick_default_model(&models, "mixtral").as_deref(), Some("gemma-7b"));
    assert_eq!(pick_default_model(&[], "llama-3.3"), None);
  }

  #[test]
  fn api_error_message_is_extracted() {
    let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Invalid API Key"));
    assert_eq!(extract_api_error("<html>"), None);
  }

  #[test]
  fn request_serializes_openai_shape() {
    let messages = [ChatMessage::system("s"), ChatMessage::user("u")];
    let req = ChatCompletionRequest { model: "m", messages: &messages, temperature: 0.1 };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["model"], "m");
    assert_eq!(v["messages"][0]["role"], "system");
    assert_eq!(v["messages"][1]["content"], "u");
  }

  #[test]
  fn client_requires_api_key() {
    assert!(LlmClient::from_settings(&Settings::default()).is_none());
    let settings = Settings { api_key: Some("k".into()), ..Settings::default() };
    let client = LlmClient::from_settings(&settings).unwrap();
    assert_eq!(client.base_url, settings.base_url);
  }
}
