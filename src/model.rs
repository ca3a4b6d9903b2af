//! Handle to a remote Gemini model.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::instrument;

use crate::chat::ChatSession;
use crate::provider::ContentGenerator;
use crate::types::{Content, GenerateRequest, GenerationConfig, Prompt};
use crate::{CompleteResponse, Error, Response};

/// Models the tutor is allowed to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelName {
    #[default]
    Gemini20FlashExp,
    Gemini15Pro,
}

impl ModelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Gemini20FlashExp => "gemini-2.0-flash-exp",
            ModelName::Gemini15Pro => "gemini-1.5-pro",
        }
    }

    /// Resolve a requested name. Anything unrecognised gets `gemini-1.5-pro`.
    pub fn select(name: &str) -> Self {
        match name.trim() {
            "gemini-2.0-flash-exp" => ModelName::Gemini20FlashExp,
            _ => ModelName::Gemini15Pro,
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = Error;

    /// Strict parse; use [`ModelName::select`] for the lenient fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gemini-2.0-flash-exp" => Ok(ModelName::Gemini20FlashExp),
            "gemini-1.5-pro" => Ok(ModelName::Gemini15Pro),
            other => Err(Error::config(format!(
                "Unknown model '{other}'. Valid values are: gemini-2.0-flash-exp, gemini-1.5-pro"
            ))),
        }
    }
}

/// A model name bound to a backend and a generation configuration.
#[derive(Clone)]
pub struct GenerativeModel {
    provider: Arc<dyn ContentGenerator>,
    model_name: String,
    generation_config: Option<GenerationConfig>,
    system_instruction: Option<Content>,
}

impl GenerativeModel {
    pub fn new(provider: Arc<dyn ContentGenerator>, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            generation_config: None,
            system_instruction: None,
        }
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::user(instruction));
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn generation_config(&self) -> Option<&GenerationConfig> {
        self.generation_config.as_ref()
    }

    /// Start a chat seeded with `history` (usually empty).
    pub fn start_chat(&self, history: Vec<Content>) -> ChatSession {
        ChatSession::new(self.clone(), history)
    }

    /// One-shot generation with no conversation history.
    #[instrument(skip_all, fields(model = %self.model_name))]
    pub async fn generate_content(
        &self,
        prompt: impl Into<Prompt>,
    ) -> Result<CompleteResponse, Error> {
        let request = self.request(vec![self.user_turn(prompt)?]);
        self.provider.generate(&request).await
    }

    pub(crate) fn user_turn(&self, prompt: impl Into<Prompt>) -> Result<Content, Error> {
        let prompt = prompt.into();
        if prompt.is_empty() {
            return Err(Error::config("Prompt must contain at least one part"));
        }
        Ok(prompt.into_content())
    }

    pub(crate) fn request(&self, contents: Vec<Content>) -> GenerateRequest {
        GenerateRequest {
            model: self.model_name.clone(),
            contents,
            system_instruction: self.system_instruction.clone(),
            generation_config: self.generation_config.clone(),
        }
    }

    pub(crate) async fn send(&self, request: &GenerateRequest) -> Result<CompleteResponse, Error> {
        self.provider.generate(request).await
    }

    pub(crate) async fn send_stream(&self, request: &GenerateRequest) -> Result<Response, Error> {
        self.provider.generate_stream(request).await
    }
}

impl fmt::Debug for GenerativeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeModel")
            .field("model_name", &self.model_name)
            .field("generation_config", &self.generation_config)
            .field("system_instruction", &self.system_instruction.is_some())
            .finish()
    }
}
