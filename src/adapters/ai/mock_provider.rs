//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling a real oracle.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Simulated delays for timeout and cancellation testing
//! - Error injection for fallback testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"symptoms": ["dizziness"]}"#)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Mock AI provider for testing.
///
/// Configurable to return specific responses, simulate delays, or inject errors.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success { content: String },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128000).with_json_mode(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
        });
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a response on a provider that is already shared.
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    /// Returns the number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Gets the next response; an empty queue behaves like an outage.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            MockResponse::Error(MockError::Unavailable {
                message: "no mock response queued".to_string(),
            })
        })
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success { content } => Ok(CompletionResponse {
                content,
                usage: TokenUsage::new(10, 20),
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
