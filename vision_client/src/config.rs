use serde::Deserialize;
use std::fmt;

pub const DEFAULT_ENDPOINT: &str = "https://api.moondream.ai/v1";

#[derive(Deserialize, Clone)]
pub struct InferenceConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the hosted API, e.g. `http://localhost:2020/v1` for a local server.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InferenceConfig {
    /// A blank override, e.g. `MOONDREAM_ENDPOINT=` in `.env`, counts as unset.
    fn endpoint_override(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }

    pub fn get_endpoint(&self) -> &str {
        self.endpoint_override()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/')
    }

    pub fn is_local(&self) -> bool {
        self.endpoint_override().is_some()
    }
}

// Keeps the key out of logs.
impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
