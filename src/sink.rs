//! Telemetry sink boundary
//!
//! Scores are forwarded to the web backend as one flat JSON object per
//! scoring event. 200 and 201 are success; any other status is logged and
//! the event dropped. There is no retry or idempotency requirement.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FocusError;
use crate::types::{ActivityFocusEvent, FaceFocusEvent};

/// Boundary trait for the telemetry backend.
pub trait TelemetrySink: Send + Sync {
    fn post_face(&self, event: &FaceFocusEvent) -> Result<(), FocusError>;
    fn post_activity(&self, event: &ActivityFocusEvent) -> Result<(), FocusError>;
}

/// HTTP telemetry sink POSTing to the web backend.
pub struct HttpTelemetrySink {
    face_url: String,
    activity_url: String,
    timeout: Duration,
}

impl HttpTelemetrySink {
    /// Build from the backend base URL, using the standard per-event routes.
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            face_url: format!("{base}/api/face-focus"),
            activity_url: format!("{base}/api/focus-log"),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn post_json(&self, url: &str, body: serde_json::Value) -> Result<(), FocusError> {
        match ureq::post(url).timeout(self.timeout).send_json(body) {
            Ok(response) => {
                debug!(url, status = response.status(), "telemetry event accepted");
                Ok(())
            }
            // Rejected events are logged and dropped, never retried.
            Err(ureq::Error::Status(status, _)) => {
                warn!(url, status, "telemetry sink rejected event");
                Ok(())
            }
            Err(e) => Err(FocusError::SinkError(e.to_string())),
        }
    }
}

impl TelemetrySink for HttpTelemetrySink {
    fn post_face(&self, event: &FaceFocusEvent) -> Result<(), FocusError> {
        self.post_json(&self.face_url, serde_json::to_value(event)?)
    }

    fn post_activity(&self, event: &ActivityFocusEvent) -> Result<(), FocusError> {
        self.post_json(&self.activity_url, serde_json::to_value(event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_routes_derive_from_base_url() {
        let sink = HttpTelemetrySink::new("http://localhost:3000/");
        assert_eq!(sink.face_url, "http://localhost:3000/api/face-focus");
        assert_eq!(sink.activity_url, "http://localhost:3000/api/focus-log");
    }
}
