//! LM Studio local server client implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::openai::{OpenAiCompatibleClient, OpenAiCompatibleModel};
use crate::client::ClientError;
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;

pub const BASE_URL_VAR: &str = "LMSTUDIO_BASE_URL";
pub const API_KEY_VAR: &str = "LMSTUDIO_API_KEY";
pub const MODEL_VAR: &str = "LMSTUDIO_MODEL";
pub const TIMEOUT_VAR: &str = "LMSTUDIO_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "LMSTUDIO_MAX_RETRIES";

const DEFAULT_API_KEY: &str = "lm-studio";
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LmStudioModel;

impl OpenAiCompatibleModel for LmStudioModel {
    fn default_api_base() -> &'static str {
        "http://localhost:1234"
    }

    fn default_model() -> &'static str {
        "llama-3.2-3b-instruct"
    }
}

pub type LmStudioClient = OpenAiCompatibleClient<LmStudioModel>;

/// Connection settings for an LM Studio server.
#[derive(Debug, Clone, PartialEq)]
pub struct LmStudioConfig {
    pub base_url: String,
    /// LM Studio accepts any key; a placeholder is fine.
    pub api_key: String,
    pub model: String,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self {
            base_url: LmStudioModel::default_api_base().to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            model: LmStudioModel::default_model().to_string(),
            timeout: None,
            max_retries: 0,
        }
    }
}

impl LmStudioConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or empty values keep the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(base_url) = get(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(api_key) = get(API_KEY_VAR) {
            config.api_key = api_key;
        }
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(secs) = get(TIMEOUT_VAR) {
            let secs: u64 = parse(TIMEOUT_VAR, &secs)?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(retries) = get(MAX_RETRIES_VAR) {
            config.max_retries = parse(MAX_RETRIES_VAR, &retries)?;
        }

        Ok(config)
    }

    pub fn transport_options(&self) -> TransportOptions {
        let mut options = TransportOptions::new().with_retries(self.max_retries, RETRY_BACKOFF);
        if let Some(timeout) = self.timeout {
            options = options.with_timeout(timeout);
        }
        options
    }

    pub fn into_client(self) -> LmStudioClient {
        let transport_options = self.transport_options();
        LmStudioClient::new(
            self.api_key,
            self.base_url,
            ModelOptions::new(self.model),
            transport_options,
        )
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ClientError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ClientError::Config(format!("{key}={value:?}: {e}")))
}

pub struct LmStudio;

impl LmStudio {
    /// Client configured from `LMSTUDIO_*` environment variables.
    pub fn from_env() -> Result<LmStudioClient, ClientError> {
        LmStudioConfig::from_env().map(LmStudioConfig::into_client)
    }
}

impl Provider for LmStudio {
    type Client = LmStudioClient;

    fn create(api_key: String) -> Self::Client {
        LmStudioConfig {
            api_key,
            ..LmStudioConfig::default()
        }
        .into_client()
    }

    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<LmStudioModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        LmStudioClient::new(
            api_key,
            LmStudioModel::default_api_base().to_string(),
            model_options,
            transport_options,
        )
    }
}
