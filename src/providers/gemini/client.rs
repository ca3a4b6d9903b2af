use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument, warn};

use super::types::*;
use crate::provider::ContentGenerator;
use crate::sse_stream::SseStream;
use crate::types::{Content, FinishReason, Part, Role};
use crate::{CompleteResponse, Error, GenerateRequest, Response, StreamEvent};

const GOOGLE_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Authentication method for the Gemini provider.
pub enum GeminiAuth {
    /// Google AI Studio key, sent as `x-goog-api-key`.
    ApiKey(String),
    /// Vertex AI access token (passed as Bearer header)
    AccessToken(String),
    /// Vertex AI via Application Default Credentials
    ApplicationDefault(Arc<dyn gcp_auth::TokenProvider>),
}

impl std::fmt::Debug for GeminiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiAuth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            GeminiAuth::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            GeminiAuth::ApplicationDefault(_) => f.write_str("ApplicationDefault"),
        }
    }
}

/// Vertex AI project and region the model is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLocation {
    pub project_id: String,
    pub location: String,
}

/// Gemini client for Google AI Studio or Vertex AI.
#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    auth: GeminiAuth,
    vertex: Option<VertexLocation>,
    base_url: Option<String>,
}

impl GeminiProvider {
    /// Create a provider that authenticates with a Google AI Studio API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::auth("API key must not be empty"));
        }
        Self::build(GeminiAuth::ApiKey(api_key), None)
    }

    /// Create a Vertex AI provider with an access token.
    pub fn vertex(
        project_id: impl Into<String>,
        location: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, Error> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::auth("Vertex access token must not be empty"));
        }
        Self::build(
            GeminiAuth::AccessToken(access_token),
            Some(Self::vertex_location(project_id.into(), location.into())?),
        )
    }

    /// Create a Vertex AI provider with Application Default Credentials.
    pub async fn vertex_with_adc(
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, Error> {
        let vertex = Self::vertex_location(project_id.into(), location.into())?;
        let token_provider = gcp_auth::provider()
            .await
            .map_err(|e| Error::auth(format!("Failed to load application default credentials: {e}")))?;
        Self::build(GeminiAuth::ApplicationDefault(token_provider), Some(vertex))
    }

    /// Send requests to a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn vertex_location(project_id: String, location: String) -> Result<VertexLocation, Error> {
        if project_id.trim().is_empty() {
            return Err(Error::config("Vertex AI project ID must not be empty"));
        }
        if location.trim().is_empty() {
            return Err(Error::config("Vertex AI location must not be empty"));
        }
        Ok(VertexLocation {
            project_id,
            location,
        })
    }

    fn build(auth: GeminiAuth, vertex: Option<VertexLocation>) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            auth,
            vertex,
            base_url: None,
        })
    }

    /// Get the endpoint URL for a model and method.
    pub fn endpoint(&self, model: &str, stream: bool) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let (method, query) = if stream {
            ("streamGenerateContent", "?alt=sse")
        } else {
            ("generateContent", "")
        };

        match &self.vertex {
            None => {
                let base = self.base_url.as_deref().unwrap_or(GOOGLE_AI_BASE_URL);
                format!(
                    "{}/v1beta/models/{model}:{method}{query}",
                    base.trim_end_matches('/')
                )
            }
            Some(VertexLocation {
                project_id,
                location,
            }) => {
                let base = match &self.base_url {
                    Some(base) => base.trim_end_matches('/').to_string(),
                    None => format!("https://{location}-aiplatform.googleapis.com"),
                };
                format!(
                    "{base}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:{method}{query}"
                )
            }
        }
    }

    /// Convert our request into the Gemini wire format.
    pub fn convert_request(request: &GenerateRequest) -> GeminiRequest {
        GeminiRequest {
            contents: request.contents.iter().map(Self::convert_content).collect(),
            system_instruction: request.system_instruction.as_ref().map(|c| GeminiContent {
                role: None,
                parts: c.parts.iter().map(Self::convert_part).collect(),
            }),
            generation_config: request.generation_config.as_ref().map(Into::into),
        }
    }

    fn convert_content(content: &Content) -> GeminiContent {
        let role = match content.role {
            Role::User => "user",
            Role::Model => "model",
        };
        GeminiContent {
            role: Some(role.to_string()),
            parts: content.parts.iter().map(Self::convert_part).collect(),
        }
    }

    fn convert_part(part: &Part) -> GeminiPart {
        match part {
            Part::Text { text } => GeminiPart::Text { text: text.clone() },
            Part::InlineData { mime_type, data } => GeminiPart::InlineData {
                inline_data: GeminiBlob {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
        }
    }

    /// Convert a full (non-streamed) response into a [`CompleteResponse`].
    pub fn convert_response(response: GeminiResponse) -> Result<CompleteResponse, Error> {
        let Some(candidate) = response.candidates.first() else {
            return Err(Self::no_candidates(&response));
        };

        let text = candidate.text();
        let finish_reason = candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::from_api)
            .unwrap_or(FinishReason::Stop);

        if text.is_empty() && finish_reason != FinishReason::Stop {
            return Err(Error::blocked(format!(
                "candidate finished with {} and no text",
                candidate.finish_reason.as_deref().unwrap_or("unknown reason")
            )));
        }

        Ok(CompleteResponse {
            content: Content::model(text),
            finish_reason,
            usage: response.usage_metadata.map(Into::into).unwrap_or_default(),
        })
    }

    /// Convert one streamed chunk into stream events.
    pub fn convert_chunk(response: GeminiResponse) -> Result<Vec<StreamEvent>, Error> {
        let mut events = Vec::new();

        let Some(candidate) = response.candidates.first() else {
            if response
                .prompt_feedback
                .as_ref()
                .is_some_and(|f| f.block_reason.is_some())
            {
                return Err(Self::no_candidates(&response));
            }
            // Trailing usage-only chunk
            if let Some(usage) = response.usage_metadata {
                events.push(StreamEvent::Done {
                    finish_reason: FinishReason::Stop,
                    usage: usage.into(),
                });
            }
            return Ok(events);
        };

        let text = candidate.text();
        if !text.is_empty() {
            events.push(StreamEvent::ContentDelta { delta: text });
        }

        if let Some(reason) = &candidate.finish_reason {
            events.push(StreamEvent::Done {
                finish_reason: FinishReason::from_api(reason),
                usage: response.usage_metadata.map(Into::into).unwrap_or_default(),
            });
        }

        Ok(events)
    }

    fn no_candidates(response: &GeminiResponse) -> Error {
        match response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            Some(reason) => Error::blocked(format!("prompt blocked: {reason}")),
            None => Error::blocked("no candidates returned"),
        }
    }

    /// Build an authenticated POST for the given URL.
    async fn post(&self, url: &str, body: &GeminiRequest) -> Result<RequestBuilder, Error> {
        let builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);

        let builder = match &self.auth {
            GeminiAuth::ApiKey(key) => builder.header("x-goog-api-key", key),
            GeminiAuth::AccessToken(token) => builder.bearer_auth(token),
            GeminiAuth::ApplicationDefault(provider) => {
                let token = provider
                    .token(&[CLOUD_PLATFORM_SCOPE])
                    .await
                    .map_err(|e| Error::auth(format!("Failed to get ADC token: {e}")))?;
                builder.bearer_auth(token.as_str())
            }
        };
        Ok(builder)
    }

    /// Turn a non-2xx response into an [`Error::Api`].
    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body
                }
            });
        warn!(status = status.as_u16(), %message, "Gemini API returned an error");
        Error::api(status.as_u16(), message)
    }
}

#[async_trait::async_trait]
impl ContentGenerator for GeminiProvider {
    #[instrument(skip_all, fields(model = %request.model, turns = request.contents.len()))]
    async fn generate(&self, request: &GenerateRequest) -> Result<CompleteResponse, Error> {
        let body = Self::convert_request(request);
        let url = self.endpoint(&request.model, false);
        debug!("sending generateContent request");

        let response = self.post(&url, &body).await?.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let bytes = response.bytes().await?;
        let parsed: GeminiResponse = serde_json::from_slice(&bytes)?;
        let complete = Self::convert_response(parsed)?;
        debug!(
            finish_reason = ?complete.finish_reason,
            output_tokens = complete.usage.output_tokens,
            "generateContent completed"
        );
        Ok(complete)
    }

    #[instrument(skip_all, fields(model = %request.model, turns = request.contents.len()))]
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<Response, Error> {
        let body = Self::convert_request(request);
        let url = self.endpoint(&request.model, true);
        debug!("sending streamGenerateContent request");

        let response = self.post(&url, &body).await?.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let event_stream = SseStream::new(response.bytes_stream())
            .map(|sse_result| -> Vec<Result<StreamEvent, Error>> {
                let sse_event = match sse_result {
                    Ok(event) => event,
                    Err(e) => return vec![Err(e)],
                };
                let data = sse_event.data.trim();
                if data.is_empty() || sse_event.is_done() {
                    return vec![];
                }
                match serde_json::from_str::<GeminiResponse>(data) {
                    Ok(chunk) => match Self::convert_chunk(chunk) {
                        Ok(events) => events.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Err(e) => vec![Err(Error::streaming(format!(
                        "Failed to parse SSE chunk: {e}"
                    )))],
                }
            })
            .flat_map(futures_util::stream::iter);

        Ok(Response::from_stream(event_stream))
    }
}
