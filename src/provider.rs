//! Face-detection provider boundary
//!
//! The provider accepts one still image over HTTP with an API-key header and
//! detection-attribute query parameters, and returns an array of detected
//! faces with nested attribute objects. Only four fields from the first face
//! are consumed: `headPose.yaw`, `headPose.pitch`, `blur.value`, and
//! `occlusion.eyeOccluded`. An empty array is a valid no-face response.

use std::time::Duration;

use serde::Deserialize;

use crate::error::FocusError;
use crate::types::FaceObservation;

/// Attributes requested from the detection endpoint.
const DETECTION_ATTRIBUTES: &str = "headPose,blur,occlusion";

/// Detection model identifier sent with every request.
const DETECTION_MODEL: &str = "detection_01";

/// One detected face as returned by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFace {
    #[serde(default)]
    pub face_attributes: FaceAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAttributes {
    #[serde(default)]
    pub head_pose: HeadPose,
    #[serde(default)]
    pub blur: Blur,
    #[serde(default)]
    pub occlusion: Occlusion,
}

/// Head orientation in signed degrees. Absent fields default to 0.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HeadPose {
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub pitch: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Blur {
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occlusion {
    #[serde(default)]
    pub eye_occluded: bool,
}

/// Extract the observation consumed by the scorer from a detection response.
pub fn first_observation(faces: &[DetectedFace]) -> Option<FaceObservation> {
    faces.first().map(|face| FaceObservation {
        yaw: face.face_attributes.head_pose.yaw,
        pitch: face.face_attributes.head_pose.pitch,
        blur_level: face.face_attributes.blur.value,
        eye_occluded: face.face_attributes.occlusion.eye_occluded,
    })
}

/// Boundary trait for face detection.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in one encoded still image.
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectedFace>, FocusError>;
}

/// HTTP face-detection client.
pub struct HttpFaceDetector {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpFaceDetector {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn detect_url(&self) -> String {
        format!("{}/face/v1.0/detect", self.endpoint.trim_end_matches('/'))
    }
}

impl FaceDetector for HttpFaceDetector {
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectedFace>, FocusError> {
        let response = ureq::post(&self.detect_url())
            .query("returnFaceAttributes", DETECTION_ATTRIBUTES)
            .query("detectionModel", DETECTION_MODEL)
            .set("Ocp-Apim-Subscription-Key", &self.api_key)
            .set("Content-Type", "application/octet-stream")
            .timeout(self.timeout)
            .send_bytes(image)
            .map_err(|e| FocusError::ProviderError(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| FocusError::ProviderError(e.to_string()))
    }
}
