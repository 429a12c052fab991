//! Configuration for the chatbot client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend base URL, matching a local development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default storage key under which the session token is kept.
pub const DEFAULT_TOKEN_KEY: &str = "chatbot_jwt_token";

/// Configuration for the chatbot client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chatbot backend, including any path prefix.
    pub base_url: String,
    /// Storage key under which the bearer token is held.
    pub token_key: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from the environment.
    ///
    /// `CHATBOT_API_BASE_URL` overrides the base URL and
    /// `CHATBOT_TOKEN_KEY` overrides the token storage key.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CHATBOT_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(key) = std::env::var("CHATBOT_TOKEN_KEY") {
            config.token_key = key;
        }
        config
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the token storage key.
    #[must_use]
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
