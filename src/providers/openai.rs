use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, ChatRequest, Provider};

/// Public API base used when no host override is configured
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client for chat completions
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, ending in `/v1`
    base_url: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Individual choice in a chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message of a choice; content may be null on refusals
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

/// Turn a host override into an API base: trailing slashes are stripped and
/// `/v1` is appended. An empty host yields the public API.
pub fn normalize_api_base(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

impl OpenAI {
    /// Create a new client
    ///
    /// `host` is an optional override such as `https://proxy.example.com`;
    /// `timeout` bounds every request.
    pub fn new(api_key: impl Into<String>, host: Option<&str>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: normalize_api_base(host.unwrap_or("")),
        })
    }

    /// The API base this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            ProviderError::ConnectionError(error.to_string())
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }

    async fn handle_error_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        let message = serde_json::from_str::<OpenAIErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded {
                message,
                retry_after_secs,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
            _ => {
                error!("OpenAI API error ({}): {}", status, message);
                ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Response = OpenAIResponse;

    async fn complete(&self, request: ChatRequest) -> Result<Self::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAIRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let parsed = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Token usage: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(parsed)
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
