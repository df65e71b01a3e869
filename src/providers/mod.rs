/*!
 * Provider implementations for the translation backend.
 *
 * - OpenAI: chat completions against the OpenAI API or any compatible host
 * - Mock: scripted provider used by the test suite
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A backend-agnostic chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// The model to use
    pub model: String,
    /// The conversation, in order
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a new request with the default translation temperature
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: 0.1,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// The content of the last message, which carries the payload
    pub fn last_content(&self) -> &str {
        self.messages.last().map(|m| m.content.as_str()).unwrap_or("")
    }
}

/// Common trait for all translation backends
///
/// A provider is stateless between calls: every batch is sent as one
/// self-contained request.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: ChatRequest) -> Result<Self::Response, ProviderError>;

    /// Extract the generated text from a response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod mock;
pub mod openai;
