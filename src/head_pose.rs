//! Head-pose focus scoring
//!
//! Derives a 0-100 focus score from head-pose angles: deviation from a
//! forward-facing dead zone costs centrality penalty, frame-to-frame change
//! costs movement penalty. The scorer keeps the previous pose, so calls must
//! be sequenced in observation order.

use chrono::Utc;

use crate::types::{round_score, FaceFocusSample, FaceObservation};

/// Head jitter within this many degrees of center is treated as focused.
const DEAD_ZONE_DEG: f64 = 5.0;

/// Penalty per degree of deviation beyond the dead zone.
const CENTRALITY_WEIGHT: f64 = 2.0;

/// Penalty per degree of frame-to-frame pose change.
const MOVEMENT_WEIGHT: f64 = 3.0;

/// Stateful head-pose focus scorer.
///
/// One instance lives for the whole sampling process; the previous pose is
/// never reset except at construction.
#[derive(Debug, Clone, Default)]
pub struct HeadPoseScorer {
    previous: Option<(f64, f64)>,
}

impl HeadPoseScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one observation.
    ///
    /// `None` input (no face detected) yields `None` and leaves the scorer
    /// state untouched; the caller skips the cycle. This is the only
    /// control-flow branch, the scorer itself never fails.
    pub fn score(&mut self, observation: Option<FaceObservation>) -> Option<FaceFocusSample> {
        let obs = observation?;

        let yaw_dev = dead_zone_deviation(obs.yaw);
        let pitch_dev = dead_zone_deviation(obs.pitch);
        let centrality_penalty = yaw_dev.hypot(pitch_dev) * CENTRALITY_WEIGHT;

        let movement_penalty = match self.previous {
            Some((prev_yaw, prev_pitch)) => {
                (obs.yaw - prev_yaw).hypot(obs.pitch - prev_pitch) * MOVEMENT_WEIGHT
            }
            None => 0.0,
        };

        self.previous = Some((obs.yaw, obs.pitch));

        let score = (100.0 - centrality_penalty - movement_penalty).clamp(0.0, 100.0);
        Some(FaceFocusSample {
            focus_score: round_score(score),
            yaw: obs.yaw,
            pitch: obs.pitch,
            eye_occluded: obs.eye_occluded,
            computed_at: Utc::now(),
        })
    }

    /// Whether an observation has been scored since process start.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Angle deviation beyond the forward-facing dead zone.
fn dead_zone_deviation(angle: f64) -> f64 {
    (angle.abs() - DEAD_ZONE_DEG).max(0.0)
}
