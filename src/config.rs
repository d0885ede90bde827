//! Configuration
//!
//! Layered: built-in defaults, then an optional JSON file, then environment
//! overrides (`FACE_API_ENDPOINT`, `FACE_API_KEY`, `SINK_URL`). Sessions
//! validate the provider credentials up front rather than failing on the
//! first detection call.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FocusError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub sink: SinkConfig,
    pub sampling: SamplingConfig,
}

/// Face-detection provider credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider base endpoint, e.g. `https://myface.cognitiveservices.azure.com`.
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Telemetry backend base URL.
    pub base_url: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between frames sent to the face-detection provider.
    pub face_interval_secs: u64,
    /// Activity window length in seconds.
    pub activity_window_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            face_interval_secs: 5,
            activity_window_secs: 300,
        }
    }
}

impl SamplingConfig {
    pub fn face_interval(&self) -> Duration {
        Duration::from_secs(self.face_interval_secs)
    }

    pub fn activity_window(&self) -> Duration {
        Duration::from_secs(self.activity_window_secs)
    }
}

impl Config {
    /// Load from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, FocusError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&raw)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("FACE_API_ENDPOINT") {
            self.provider.endpoint = endpoint;
        }
        if let Ok(api_key) = std::env::var("FACE_API_KEY") {
            self.provider.api_key = api_key;
        }
        if let Ok(base_url) = std::env::var("SINK_URL") {
            self.sink.base_url = base_url;
        }
    }

    /// Reject configurations that cannot start a session.
    pub fn validate(&self) -> Result<(), FocusError> {
        if self.provider.endpoint.is_empty() {
            return Err(FocusError::ConfigError(
                "provider endpoint is not set".to_string(),
            ));
        }
        if self.provider.api_key.is_empty() {
            return Err(FocusError::ConfigError(
                "provider api key is not set".to_string(),
            ));
        }
        if self.sampling.face_interval_secs == 0 {
            return Err(FocusError::ConfigError(
                "face interval must be at least one second".to_string(),
            ));
        }
        if self.sampling.activity_window_secs == 0 {
            return Err(FocusError::ConfigError(
                "activity window must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
