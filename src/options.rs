//! Generic options structures for model and transport configuration.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;

/// Generic model options containing common model behavior parameters
/// and provider-specific model configuration.
///
/// This struct allows configuring both universal parameters (like temperature)
/// and provider-specific parameters (via the generic `T`).
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOptions<T> {
    /// Model identifier (e.g., "llama-3.2-3b-instruct").
    pub model: String,

    /// System instructions. The orchestrator sends these as the first message
    /// unless it was given its own system prompt.
    pub system: Option<String>,

    /// Temperature for sampling (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Top-p (nucleus) sampling parameter.
    pub top_p: Option<f32>,

    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,

    /// Provider-specific model options, flattened into the request body.
    pub provider: T,
}

impl<T: Default> ModelOptions<T> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            provider: T::default(),
        }
    }

    /// Set the system instructions.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each following one.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Transport configuration options.
///
/// Controls how requests are sent over the network.
#[derive(Debug, Clone)]
pub enum TransportOptions {
    /// HTTP transport configuration
    Http {
        /// Request timeout. If None, default client timeout is used.
        timeout: Option<Duration>,
        /// HTTP proxy URL.
        proxy: Option<String>,
        /// Additional HTTP headers to send with every request.
        headers: Option<HashMap<String, String>>,
        /// Retry behaviour for failed requests.
        retry: RetryPolicy,
    },
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions::Http {
            timeout: None,
            proxy: None,
            headers: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportOptions {
    /// Create new default HTTP transport options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        match &mut self {
            TransportOptions::Http { timeout, .. } => *timeout = Some(duration),
        }
        self
    }

    /// Set the proxy.
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        match &mut self {
            TransportOptions::Http { proxy, .. } => *proxy = Some(proxy_url),
        }
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        match &mut self {
            TransportOptions::Http { headers, .. } => {
                headers.get_or_insert_with(HashMap::new).insert(key, value);
            }
        }
        self
    }

    /// Retry failed requests up to `max_retries` times.
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        match &mut self {
            TransportOptions::Http { retry, .. } => {
                retry.max_retries = max_retries;
                retry.initial_backoff = initial_backoff;
            }
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            TransportOptions::Http { retry, .. } => *retry,
        }
    }
}
