/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scripted provider that simulates different backends:
 * - `MockProvider::echo()` - Answers every payload tag with a marked copy
 * - `MockProvider::rate_limited(n)` - Signals rate limiting `n` times, then echoes
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::connection_abort()` - Always fails as if the connection dropped
 * - `MockProvider::dropping(indices)` - Echoes but leaves out some tags
 *
 * Every request is recorded so tests can inspect what was sent.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, Provider};

/// Regex for the tagged payload items
static PAYLOAD_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<translate i="(\d+)">(.*?)</translate>"#).expect("Invalid payload tag regex")
});

/// Prefix the echo behavior puts in front of every translation
pub const ECHO_PREFIX: &str = "[TRANSLATED] ";

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The generated text
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Answers every tag of the payload
    Echo,
    /// Signals rate limiting for the first `times` requests, then echoes
    RateLimited { times: usize },
    /// Always fails with an API error
    Failing,
    /// Always fails with a connection error
    ConnectionAbort,
    /// Echoes, leaving out the listed tag indices
    Dropping(Vec<usize>),
    /// Fails every Nth request (1-based), echoes otherwise
    Intermittent { fail_every: usize },
    /// Returns empty text
    Empty,
    /// Produces the text with a custom generator
    Custom(fn(&ChatRequest) -> String),
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, shared between clones
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn rate_limited(times: usize) -> Self {
        Self::new(MockBehavior::RateLimited { times })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn connection_abort() -> Self {
        Self::new(MockBehavior::ConnectionAbort)
    }

    pub fn dropping(indices: Vec<usize>) -> Self {
        Self::new(MockBehavior::Dropping(indices))
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn custom(generator: fn(&ChatRequest) -> String) -> Self {
        Self::new(MockBehavior::Custom(generator))
    }

    /// Number of `complete` calls so far, including failed ones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Answer the payload of `request`, skipping the `dropped` indices
    pub fn echo_payload(request: &ChatRequest, dropped: &[usize]) -> String {
        PAYLOAD_TAG_REGEX
            .captures_iter(request.last_content())
            .filter_map(|caps| {
                let index: usize = caps[1].parse().ok()?;
                if dropped.contains(&index) {
                    return None;
                }
                Some(format!(
                    "<translate i=\"{}\">{}{}</translate>",
                    index, ECHO_PREFIX, &caps[2]
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Response = MockResponse;

    async fn complete(&self, request: ChatRequest) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let text = match &self.behavior {
            MockBehavior::Echo => Self::echo_payload(&request, &[]),
            MockBehavior::RateLimited { times } => {
                if count < *times {
                    return Err(ProviderError::RateLimitExceeded {
                        message: format!("Simulated rate limit (request #{})", count + 1),
                        retry_after_secs: Some(1),
                    });
                }
                Self::echo_payload(&request, &[])
            }
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "Simulated provider failure".to_string(),
                });
            }
            MockBehavior::ConnectionAbort => {
                return Err(ProviderError::ConnectionError("Simulated connection reset".to_string()));
            }
            MockBehavior::Dropping(indices) => Self::echo_payload(&request, indices),
            MockBehavior::Intermittent { fail_every } => {
                if *fail_every > 0 && count % fail_every == fail_every - 1 {
                    return Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    });
                }
                Self::echo_payload(&request, &[])
            }
            MockBehavior::Empty => String::new(),
            MockBehavior::Custom(generator) => generator(&request),
        };

        Ok(MockResponse { text })
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
