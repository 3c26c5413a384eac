//! OpenAI-compatible Provider - Implementation of AIProvider for chat-completions APIs.
//!
//! Works against any endpoint speaking the OpenAI chat-completions protocol.
//! The default base URL points at Groq.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("llama-3.1-70b-versatile")
//!     .with_base_url("https://api.groq.com/openai/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, ResponseFormat, TokenUsage,
};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Base delay of the exponential backoff.
    pub retry_base_delay: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 1,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to the wire format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(OpenAIResponseFormat {
                    kind: "json_object".to_string(),
                }),
            },
        }
    }

    /// Sends a request.
    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses to errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(Self::status_error(status.as_u16(), error_body))
    }

    fn status_error(status: u16, error_body: String) -> AIError {
        match status {
            401 | 403 => AIError::AuthenticationFailed,
            429 => AIError::rate_limited(Self::parse_retry_after(&error_body)),
            400 => AIError::InvalidRequest(error_body),
            500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
            _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                    if let Ok(secs) = digits.parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
        30
    }

    /// Parses a completion response.
    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::into_completion(openai_response)
    }

    fn into_completion(openai_response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        if finish_reason == FinishReason::ContentFilter
            && choice.message.content.trim().is_empty()
        {
            return Err(AIError::content_filtered("completion withheld by provider filter"));
        }

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send_request(&request).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(completion) => {
                    debug!(
                        operation = request.metadata.operation,
                        tokens = completion.usage.total_tokens,
                        "Oracle completion received"
                    );
                    return Ok(completion);
                }
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    warn!(
                        operation = request.metadata.operation,
                        attempt = retry_count + 1,
                        error = %err,
                        "Oracle call failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }

            // Exponential backoff: base, 2x base, 4x base, ...
            let delay = self.config.retry_base_delay * (1u32 << retry_count.min(8));
            sleep(delay).await;
            retry_count += 1;
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        let name = if self.config.base_url.contains("groq.com") {
            "groq"
        } else {
            "openai"
        };
        ProviderInfo::new(name, &self.config.model, 128_000).with_json_mode(true)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConsultationId, UserId};
    use crate::ports::RequestMetadata;

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            UserId::new("u").unwrap(),
            ConsultationId::new(),
            "suggest",
            "trace",
        ))
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn defaults_point_at_groq() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("k")).unwrap();
        assert_eq!(provider.completions_url(), "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(provider.provider_info().name, "groq");
        assert!(provider.provider_info().supports_json_mode);
    }

    #[test]
    fn request_puts_system_prompt_first_and_sets_json_mode() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("k")).unwrap();
        let req = request()
            .with_system_prompt("You are a triage assistant")
            .with_message(MessageRole::User, "headache")
            .with_temperature(0.3)
            .with_json_response();

        let wire = serde_json::to_value(provider.to_openai_request(&req)).unwrap();
        assert_eq!(wire["messages"][0]["role"], "system");
        assert_eq!(wire["messages"][1]["content"], "headache");
        assert_eq!(wire["response_format"]["type"], "json_object");
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn text_requests_omit_response_format() {
        let provider = OpenAIProvider::new(OpenAIConfig::new("k")).unwrap();
        let wire = serde_json::to_value(provider.to_openai_request(&request())).unwrap();
        assert!(wire.get("response_format").is_none());
    }

    #[test]
    fn status_errors_are_classified() {
        assert!(matches!(
            OpenAIProvider::status_error(401, String::new()),
            AIError::AuthenticationFailed
        ));
        assert!(OpenAIProvider::status_error(503, "down".into()).is_retryable());
        assert!(!OpenAIProvider::status_error(400, "bad".into()).is_retryable());
    }

    #[test]
    fn completion_is_extracted_from_first_choice() {
        let body = r#"{
            "model": "llama",
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        let completion = OpenAIProvider::into_completion(parsed).unwrap();
        assert_eq!(completion.content, "{\"ok\":true}");
        assert_eq!(completion.usage.total_tokens, 15);
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn filtered_empty_completion_is_content_filtered() {
        let body = r#"{
            "model": "llama",
            "choices": [{"message": {"role": "assistant", "content": ""}, "finish_reason": "content_filter"}]
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        let err = OpenAIProvider::into_completion(parsed).unwrap_err();
        assert!(matches!(err, AIError::ContentFiltered { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let parsed: OpenAIResponse =
            serde_json::from_str(r#"{"model":"m","choices":[]}"#).unwrap();
        assert!(matches!(
            OpenAIProvider::into_completion(parsed),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }
}
