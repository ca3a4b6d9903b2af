//! The `olevel-tutor` command: one prompt, one reply, printed.

use std::env;
use std::io::Write;
use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{info, instrument, warn};

use crate::model::{GenerativeModel, ModelName};
use crate::providers::GeminiProvider;
use crate::tutor::ENGLISH_TUTOR_PROMPT;
use crate::types::GenerationConfig;
use crate::{Error, FinishReason, StreamEvent};

const DEFAULT_VERTEX_REGION: &str = "us-central1";

/// How the binary authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Google AI Studio API key
    ApiKey(String),
    /// Vertex AI, with an explicit token or Application Default Credentials
    Vertex {
        project_id: String,
        location: String,
        access_token: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::Vertex {
                project_id,
                location,
                access_token,
            } => f
                .debug_struct("Vertex")
                .field("project_id", project_id)
                .field("location", location)
                .field("access_token", &access_token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Runtime settings for the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub credentials: Credentials,
    pub model: ModelName,
    pub base_url: Option<String>,
    pub stream: bool,
}

impl Settings {
    /// Settings for an API key with every other option at its default.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::ApiKey(api_key.into()),
            model: ModelName::default(),
            base_url: None,
            stream: false,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let credentials = if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            Credentials::ApiKey(key)
        } else if let Some(project_id) = get("GOOGLE_CLOUD_PROJECT") {
            Credentials::Vertex {
                project_id,
                location: get("GOOGLE_CLOUD_REGION")
                    .unwrap_or_else(|| DEFAULT_VERTEX_REGION.to_string()),
                access_token: get("VERTEX_ACCESS_TOKEN"),
            }
        } else {
            return Err(Error::config(
                "No credentials found. Set GEMINI_API_KEY, or GOOGLE_CLOUD_PROJECT for Vertex AI",
            ));
        };

        let model = match get("GEMINI_MODEL") {
            Some(name) => {
                let selected = ModelName::select(&name);
                if selected.as_str() != name.trim() {
                    warn!(requested = %name, using = %selected, "unknown model requested");
                }
                selected
            }
            None => ModelName::default(),
        };

        let stream = match get("TUTOR_STREAM") {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(Error::config(format!(
                        "Invalid TUTOR_STREAM '{other}'. Use true or false"
                    )))
                }
            },
        };

        Ok(Self {
            credentials,
            model,
            base_url: get("GEMINI_BASE_URL"),
            stream,
        })
    }

    /// Build the Gemini client these settings describe.
    pub async fn build_provider(&self) -> Result<GeminiProvider, Error> {
        let provider = match &self.credentials {
            Credentials::ApiKey(key) => GeminiProvider::new(key.clone())?,
            Credentials::Vertex {
                project_id,
                location,
                access_token: Some(token),
            } => GeminiProvider::vertex(project_id.clone(), location.clone(), token.clone())?,
            Credentials::Vertex {
                project_id,
                location,
                access_token: None,
            } => GeminiProvider::vertex_with_adc(project_id.clone(), location.clone()).await?,
        };
        Ok(match &self.base_url {
            Some(url) => provider.with_base_url(url.clone()),
            None => provider,
        })
    }
}

/// Send the English tutor prompt in a fresh chat and write the reply to `out`.
///
/// Nothing is sent if the client cannot be built. The reply text is written
/// verbatim followed by a newline.
#[instrument(skip_all, fields(model = %settings.model, stream = settings.stream))]
pub async fn run<W: Write>(settings: &Settings, out: &mut W) -> Result<(), Error> {
    let provider = settings.build_provider().await?;
    let model = GenerativeModel::new(Arc::new(provider), settings.model.as_str())
        .with_generation_config(GenerationConfig::tutor_defaults());
    let mut chat = model.start_chat(Vec::new());
    info!(session = %chat.id(), "chat started");

    if settings.stream {
        let mut events = chat.send_message_stream(ENGLISH_TUTOR_PROMPT).await?.stream();
        let mut written = false;
        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::ContentDelta { delta } => {
                    write!(out, "{delta}")?;
                    out.flush()?;
                    written |= !delta.is_empty();
                }
                StreamEvent::Done { finish_reason, .. } => {
                    // Same rule as the buffered path: no text and an abnormal finish.
                    if !written && finish_reason != FinishReason::Stop {
                        return Err(Error::blocked(format!(
                            "stream finished with {finish_reason:?} and no text"
                        )));
                    }
                    break;
                }
                StreamEvent::Error { error } => return Err(Error::streaming(error)),
            }
        }
        writeln!(out)?;
    } else {
        let reply = chat.send_message(ENGLISH_TUTOR_PROMPT).await?;
        writeln!(out, "{}", reply.text())?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_api_key_from_env() {
        let settings = Settings::from_lookup(lookup(&[("GEMINI_API_KEY", "abc")])).unwrap();
        assert_eq!(settings, Settings::with_api_key("abc"));
        assert_eq!(settings.model.as_str(), "gemini-2.0-flash-exp");
        assert!(!settings.stream);
    }

    #[test]
    fn test_google_api_key_fallback() {
        let settings = Settings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "  "),
            ("GOOGLE_API_KEY", "xyz"),
        ]))
        .unwrap();
        assert_eq!(settings.credentials, Credentials::ApiKey("xyz".to_string()));
    }

    #[test]
    fn test_vertex_from_env() {
        let settings = Settings::from_lookup(lookup(&[
            ("GOOGLE_CLOUD_PROJECT", "tutor-project"),
            ("VERTEX_ACCESS_TOKEN", "tok"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("TUTOR_STREAM", "true"),
        ]))
        .unwrap();
        assert_eq!(
            settings.credentials,
            Credentials::Vertex {
                project_id: "tutor-project".to_string(),
                location: "us-central1".to_string(),
                access_token: Some("tok".to_string()),
            }
        );
        assert_eq!(settings.model, ModelName::Gemini15Pro);
        assert!(settings.stream);
    }

    #[test]
    fn test_missing_credentials() {
        let result = Settings::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_stream_flag() {
        let result = Settings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "abc"),
            ("TUTOR_STREAM", "sometimes"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_credentials_debug_redacted() {
        let printed = format!("{:?}", Settings::with_api_key("secret-key"));
        assert!(!printed.contains("secret-key"));
    }
}
