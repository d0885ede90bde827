//! Error types for Aura Focus

use thiserror::Error;

/// Errors that can occur while sampling and forwarding focus scores
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Face detection request failed: {0}")]
    ProviderError(String),

    #[error("Telemetry sink request failed: {0}")]
    SinkError(String),

    #[error("Frame source unavailable: {0}")]
    FrameSourceError(String),

    #[error("Missing required session parameter: {0}")]
    MissingParameter(String),

    #[error("Session already running for user: {0}")]
    SessionAlreadyRunning(String),

    #[error("No session running for user: {0}")]
    SessionNotFound(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
