use crate::core::{RelayError, UpstreamConfig};
use crate::eventsource::{Event, EventSourceExt};
use crate::providers::llm::{FragmentStream, UpstreamClient};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, StatusCode,
};

use super::types::{GenerateContentRequest, GenerateContentResponse};

/// Client for Gemini's `streamGenerateContent` endpoint
pub struct GeminiClient {
    api_key: String,
    client: Client,
    config: UpstreamConfig,
}

impl GeminiClient {
    pub fn new(api_key: String, config: UpstreamConfig) -> Self {
        Self {
            api_key,
            client: Client::new(),
            config,
        }
    }

    /// Reads the key from `GEMINI_API_KEY`, then `GOOGLE_API_KEY`, honoring `.env`.
    pub fn from_env(config: UpstreamConfig) -> Result<Self, RelayError> {
        let api_key = dotenv::var("GEMINI_API_KEY")
            .or_else(|_| dotenv::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                RelayError::ConfigError(
                    "GEMINI_API_KEY or GOOGLE_API_KEY must be set in .env or environment"
                        .to_string(),
                )
            })?;
        Ok(Self::new(api_key, config))
    }

    fn stream_url(&self) -> String {
        format!(
            "{base}/models/{model}:streamGenerateContent?alt=sse",
            base = self.config.base_url.trim_end_matches('/'),
            model = self.config.model
        )
    }

    fn build_headers(&self) -> Result<HeaderMap, RelayError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| RelayError::ConfigError(format!("Invalid API key header: {e}")))?;
        headers.insert("x-goog-api-key", key);
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        Ok(headers)
    }

    async fn request_stream(
        &self,
        request: &GenerateContentRequest<'_>,
    ) -> Result<reqwest::Response, RelayError> {
        let response = self
            .client
            .post(self.stream_url())
            .headers(self.build_headers()?)
            .json(request)
            .send()
            .await
            .map_err(RelayError::from)?;

        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RelayError::Authentication(
                "Invalid API key or unauthorized access".to_string(),
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(RelayError::Upstream(format!(
                    "API request failed with status {status}: {error_text}"
                )))
            }
        }
    }
}

impl TryFrom<Event> for GenerateContentResponse {
    type Error = RelayError;

    fn try_from(event: Event) -> Result<Self, RelayError> {
        serde_json::from_str(&event.data).map_err(|e| {
            RelayError::Upstream(format!(
                "Failed to parse Gemini stream event: {event}. Error: {e}"
            ))
        })
    }
}

/// Extracts one fragment's text, treating in-band errors and blocked prompts as failures.
fn fragment_text(response: &GenerateContentResponse) -> Result<String, RelayError> {
    if let Some(error) = &response.error {
        return Err(RelayError::Upstream(format!(
            "Gemini stream error {code}: {message}",
            code = error.code,
            message = error.message
        )));
    }
    if let Some(reason) = response.block_reason() {
        return Err(RelayError::Upstream(format!("Prompt blocked: {reason}")));
    }
    Ok(response.text())
}

/// Turns decoded upstream events into text fragments, failing on in-band errors.
fn events_to_fragments<S>(mut stream: S) -> impl Stream<Item = Result<String, RelayError>> + Send
where
    S: Stream<Item = Result<Event, reqwest::Error>> + Send + Unpin,
{
    try_stream! {
        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| RelayError::StreamError(e.to_string()))?;
            let response = GenerateContentResponse::try_from(event)?;

            let text = fragment_text(&response)?;
            if !text.is_empty() {
                yield text;
            }
        }
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    async fn stream_generate(&self, prompt: &str) -> Result<FragmentStream, RelayError> {
        let request = GenerateContentRequest::new(prompt)
            .with_system_instruction(&self.config.system_instruction)
            .with_thinking_budget(self.config.thinking_budget);

        debug!("[Gemini] streaming from model {}", self.config.model);
        let response = self.request_stream(&request).await?;

        Ok(events_to_fragments(response.events()).boxed())
    }
}
