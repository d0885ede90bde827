//! Core data model for focus telemetry
//!
//! Two independent pipelines share nothing but this module: the head-pose
//! path consumes [`FaceObservation`]s and produces [`FaceFocusSample`]s, the
//! activity path consumes [`InputEvent`]s and produces [`ActivitySample`]s.
//! The `*Event` types at the bottom are the sink wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single face measurement, produced once per sampled frame.
///
/// Transient: consumed immediately by the scorer and discarded. Angles are
/// signed degrees and default to 0 when the provider omits them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(default)]
    pub yaw: f64,
    #[serde(default)]
    pub pitch: f64,
    /// Provider blur estimate (advisory, does not affect the score).
    #[serde(default)]
    pub blur_level: f64,
    /// Whether the provider reports the eyes occluded (advisory).
    #[serde(default)]
    pub eye_occluded: bool,
}

/// A scored head-pose observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceFocusSample {
    /// Focus score in [0, 100], rounded to one decimal.
    pub focus_score: f64,
    pub yaw: f64,
    pub pitch: f64,
    /// Advisory fatigue hint carried through from the observation.
    pub eye_occluded: bool,
    pub computed_at: DateTime<Utc>,
}

/// A scored activity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySample {
    pub key_presses: u64,
    pub mouse_clicks: u64,
    /// Accumulated Euclidean cursor travel in pixels.
    pub mouse_distance: f64,
    /// Focus score in [0, 100], rounded to one decimal.
    pub focus_score: f64,
    pub computed_at: DateTime<Utc>,
}

/// A discrete input event delivered to the activity sampling loop.
///
/// Input hooks publish these over a channel instead of mutating shared
/// counters; the sampling loop owns the counters and applies events in
/// arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum InputEvent {
    KeyPress,
    MouseClick,
    MouseMove { x: f64, y: f64 },
}

/// Face-focus telemetry event (sink wire format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceFocusEvent {
    pub user_id: String,
    pub focus_score: f64,
    pub yaw: f64,
    pub pitch: f64,
}

/// Activity-focus telemetry event (sink wire format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFocusEvent {
    pub user_id: String,
    pub keyboard: u64,
    pub mouse_clicks: u64,
    /// Cursor travel rounded to whole pixels.
    pub mouse_distance: u64,
    pub focus_score: f64,
}

/// Round a score to one decimal place.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_face_event_wire_format_is_camel_case() {
        let event = FaceFocusEvent {
            user_id: "user-1".to_string(),
            focus_score: 87.5,
            yaw: 12.0,
            pitch: -3.0,
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["focusScore"], 87.5);
        assert_eq!(json["yaw"], 12.0);
        assert_eq!(json["pitch"], -3.0);
    }

    #[test]
    fn test_activity_event_wire_format() {
        let event = ActivityFocusEvent {
            user_id: "user-1".to_string(),
            keyboard: 42,
            mouse_clicks: 7,
            mouse_distance: 1024,
            focus_score: 33.4,
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["keyboard"], 42);
        assert_eq!(json["mouseClicks"], 7);
        assert_eq!(json["mouseDistance"], 1024);
        assert_eq!(json["focusScore"], 33.4);
    }

    #[test]
    fn test_input_event_tagged_deserialization() {
        let event: InputEvent =
            serde_json::from_str(r#"{"event_type":"mouse_move","x":3.0,"y":4.0}"#).unwrap();
        assert_eq!(event, InputEvent::MouseMove { x: 3.0, y: 4.0 });

        let event: InputEvent = serde_json::from_str(r#"{"event_type":"key_press"}"#).unwrap();
        assert_eq!(event, InputEvent::KeyPress);
    }

    #[test]
    fn test_face_observation_defaults() {
        let obs: FaceObservation = serde_json::from_str("{}").unwrap();
        assert_eq!(obs.yaw, 0.0);
        assert_eq!(obs.pitch, 0.0);
        assert_eq!(obs.blur_level, 0.0);
        assert!(!obs.eye_occluded);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(33.333), 33.3);
        assert_eq!(round_score(99.97), 100.0);
        assert_eq!(round_score(0.04), 0.0);
    }
}
