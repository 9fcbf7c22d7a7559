//! OpenAI API client implementation.

use crate::api::openai::{OpenAiCompatibleClient, OpenAiCompatibleModel};
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiModel;

impl OpenAiCompatibleModel for OpenAiModel {
    fn default_api_base() -> &'static str {
        "https://api.openai.com"
    }

    fn default_model() -> &'static str {
        "gpt-4o-mini"
    }
}

pub type OpenAiClient = OpenAiCompatibleClient<OpenAiModel>;

pub struct OpenAi;

impl Provider for OpenAi {
    type Client = OpenAiClient;

    fn create(api_key: String) -> Self::Client {
        Self::create_with_options(
            api_key,
            ModelOptions::new(OpenAiModel::default_model()),
            TransportOptions::default(),
        )
    }

    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<OpenAiModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        OpenAiClient::new(
            api_key,
            OpenAiModel::default_api_base().to_string(),
            model_options,
            transport_options,
        )
    }
}
