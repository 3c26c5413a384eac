//! AI Provider Port - Interface for the language-model oracle transport.
//!
//! The advisory gateway talks to the oracle only through this port, so the
//! dialogue never depends on a specific vendor API.
//!
//! # Design
//!
//! - Single non-streaming completion call; the gateway needs whole JSON documents
//! - Provider-agnostic message format
//! - Optional JSON response mode for providers that support it
//! - Error types for common failure modes (rate limits, auth, network)
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl AIProvider for EchoProvider {
//!     async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
//!         Ok(CompletionResponse {
//!             content: "{}".to_string(),
//!             usage: TokenUsage::default(),
//!             model: "echo".to_string(),
//!             finish_reason: FinishReason::Stop,
//!         })
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo", 4096)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConsultationId, UserId};

/// Port for AI/LLM provider interactions.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Get provider information (name, model, capabilities).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for AI completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness (0.0 = deterministic, 1.0+ = creative).
    pub temperature: Option<f32>,
    /// Expected shape of the response body.
    pub response_format: ResponseFormat,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    /// Creates a new completion request with required metadata.
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
            metadata,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Asks the provider for a JSON object response.
    pub fn with_json_response(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

/// Requested response body format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Patient the request is made for.
    pub user_id: UserId,
    /// Consultation the request belongs to.
    pub consultation_id: ConsultationId,
    /// Gateway operation name (validate, suggest, recommend, assess).
    pub operation: &'static str,
    /// Trace ID for log correlation.
    pub trace_id: String,
}

impl RequestMetadata {
    /// Creates new request metadata.
    pub fn new(
        user_id: UserId,
        consultation_id: ConsultationId,
        operation: &'static str,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            consultation_id,
            operation,
            trace_id: trace_id.into(),
        }
    }
}

/// Response from AI completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// An error occurred.
    Error,
}

/// Provider information and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "groq").
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Maximum context window size in tokens.
    pub max_context_tokens: u32,
    /// Whether a JSON response format can be requested.
    pub supports_json_mode: bool,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>, max_context_tokens: u32) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            max_context_tokens,
            supports_json_mode: false,
        }
    }

    /// Sets JSON mode support.
    pub fn with_json_mode(mut self, supports: bool) -> Self {
        self.supports_json_mode = supports;
        self
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
