//! Core client trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Message, Response};
use crate::options::{ModelOptions, TransportOptions};
use crate::tools::ToolDefinition;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The endpoint couldn't be reached, or the request timed out.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Remote { status, .. } => *status == 429 || *status >= 500,
            ClientError::MalformedResponse(_) | ClientError::Config(_) => false,
        }
    }
}

/// Main client trait for chat-completion endpoints.
#[async_trait]
pub trait Client: Send + Sync {
    /// Provider-specific model options type.
    type ModelProvider: Send + Sync;

    /// Send the conversation and tool definitions; returns every choice.
    async fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<Response, ClientError>;

    /// Get reference to the model options.
    fn model_options(&self) -> &ModelOptions<Self::ModelProvider>;

    /// Get reference to the transport options.
    fn transport_options(&self) -> &TransportOptions;

    /// Send one completion request and return the first choice.
    ///
    /// `None` and an empty tool list both send no tools.
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Message, ClientError> {
        let response = self.request(messages, tools.unwrap_or_default()).await?;
        response.data.into_iter().next().ok_or_else(|| {
            ClientError::MalformedResponse("response contained no choices".to_string())
        })
    }
}
