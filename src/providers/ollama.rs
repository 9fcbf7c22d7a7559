//! Ollama API client implementation.

use serde::{Deserialize, Serialize};
use crate::api::openai::{OpenAiCompatibleClient, OpenAiCompatibleModel};
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaModel;

impl OpenAiCompatibleModel for OllamaModel {
    fn default_api_base() -> &'static str {
        "http://localhost:11434"
    }

    fn default_model() -> &'static str {
        "llama3.2"
    }
}

pub type OllamaClient = OpenAiCompatibleClient<OllamaModel>;

pub struct Ollama;

impl Ollama {
    /// Client for an Ollama server at `base_url` with the default model.
    pub fn at(base_url: String) -> OllamaClient {
        OllamaClient::new(
            "ollama".to_string(),
            base_url,
            ModelOptions::new(OllamaModel::default_model()),
            TransportOptions::default(),
        )
    }
}

impl Provider for Ollama {
    type Client = OllamaClient;

    // Ollama ignores the key, but the header is still sent.
    fn create(api_key: String) -> Self::Client {
        Self::create_with_options(
            api_key,
            ModelOptions::new(OllamaModel::default_model()),
            TransportOptions::default(),
        )
    }

    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<OllamaModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        OllamaClient::new(
            api_key,
            OllamaModel::default_api_base().to_string(),
            model_options,
            transport_options,
        )
    }
}
