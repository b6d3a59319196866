//! Application state: the single exam session, the LLM backend, prompts and the
//! model list.
//!
//! This module owns:
//!   - the one `ExamSession` (behind an async lock, passed to every handler)
//!   - the optional LLM backend (`None` when no API key was configured)
//!   - the model list, fetched once at startup and reused for the process lifetime
//!   - the prompts struct (from TOML or defaults)

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_exam_config_from_env, Prompts, Settings};
use crate::error::ExamError;
use crate::llm::{pick_default_model, ChatBackend, LlmClient};
use crate::session::ExamSession;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<ExamSession>>,
    pub llm: Option<Arc<dyn ChatBackend>>,
    pub models: Arc<Vec<String>>,
    pub default_model: Option<String>,
    pub prompts: Prompts,
    pub strict_validation: bool,
}

impl AppState {
    /// Build state from env: load settings and prompts, init the LLM client, fetch models.
    #[instrument(level = "info", skip_all)]
    pub async fn from_env(settings: &Settings) -> Self {
        let prompts = load_exam_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let llm: Option<Arc<dyn ChatBackend>> = match LlmClient::from_settings(settings) {
            Some(client) => {
                info!(target: "mockexam_backend", base_url = %client.base_url, "LLM client configured.");
                Some(Arc::new(client) as Arc<dyn ChatBackend>)
            }
            None => {
                error!(target: "mockexam_backend", "Config Missing: LLM_API_KEY / GROQ_API_KEY not set. All exam actions are disabled.");
                None
            }
        };

        Self::initialize(llm, prompts, settings).await
    }

    /// Assemble state around any backend. Fetches the model list exactly once;
    /// a failed listing leaves the service offline.
    pub async fn initialize(llm: Option<Arc<dyn ChatBackend>>, prompts: Prompts, settings: &Settings) -> Self {
        let models = match &llm {
            Some(backend) => match backend.list_models().await {
                Ok(models) => models,
                Err(e) => {
                    warn!(target: "mockexam_backend", error = %e, "Model listing failed; service is offline.");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let default_model = pick_default_model(&models, &settings.preferred_model);
        info!(target: "mockexam_backend", models = models.len(), default_model = ?default_model, strict = settings.strict_validation, "Startup model inventory");

        Self {
            session: Arc::new(RwLock::new(ExamSession::new())),
            llm,
            models: Arc::new(models),
            default_model,
            prompts,
            strict_validation: settings.strict_validation,
        }
    }

    pub fn configured(&self) -> bool {
        self.llm.is_some()
    }

    pub fn online(&self) -> bool {
        self.configured() && !self.models.is_empty()
    }

    /// The backend, or `ConfigMissing`.
    pub fn backend(&self) -> Result<Arc<dyn ChatBackend>, ExamError> {
        self.llm.clone().ok_or(ExamError::ConfigMissing)
    }

    /// The requested model if it is listed, else the default one.
    pub fn resolve_model(&self, requested: Option<&str>) -> Result<String, ExamError> {
        if self.models.is_empty() {
            return Err(ExamError::ModelListUnavailable);
        }
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if self.models.iter().any(|known| known == m) => Ok(m.to_string()),
            Some(m) => Err(ExamError::ValidationFailed(format!("Unknown model: {}", m))),
            None => self.default_model.clone().ok_or(ExamError::ModelListUnavailable),
        }
    }
}
