//! Input-activity focus scoring
//!
//! Keyboard and mouse activity is accumulated over a fixed wall-clock window
//! and collapsed into a 0-100 focus score. Each channel saturates
//! independently at its own cap before summing, so no single input dimension
//! can exceed its allotted weight (50/20/30).

use chrono::Utc;

use crate::types::{round_score, ActivitySample, InputEvent};

/// Key presses at which the keyboard channel saturates.
///
/// Earlier tracker revisions used anywhere from 150 to 300; 150 is the
/// canonical cap (one press every two seconds over a five-minute window).
pub const KEY_SATURATION: u64 = 150;

/// Mouse clicks at which the click channel saturates (revisions used 30-100).
pub const CLICK_SATURATION: u64 = 30;

/// Cursor travel in pixels at which the movement channel saturates
/// (revisions used 2000-5000).
pub const DISTANCE_SATURATION: f64 = 2000.0;

const KEY_WEIGHT: f64 = 50.0;
const CLICK_WEIGHT: f64 = 20.0;
const MOVE_WEIGHT: f64 = 30.0;

/// Compute the activity focus score for one window.
///
/// Pure and total over all non-negative inputs; monotonically non-decreasing
/// in each input independently. Rounded to one decimal.
pub fn focus_score(key_presses: u64, mouse_clicks: u64, mouse_distance: f64) -> f64 {
    let key_score = (key_presses as f64 / KEY_SATURATION as f64).min(1.0) * KEY_WEIGHT;
    let click_score = (mouse_clicks as f64 / CLICK_SATURATION as f64).min(1.0) * CLICK_WEIGHT;
    let move_score = (mouse_distance.max(0.0) / DISTANCE_SATURATION).min(1.0) * MOVE_WEIGHT;
    round_score(key_score + click_score + move_score)
}

/// Windowed keyboard/mouse counters, owned by the activity sampling loop.
///
/// Counters are non-negative and monotonically non-decreasing within a
/// window; [`flush`](Self::flush) resets them to zero. The last cursor
/// position survives the flush so travel keeps accruing from the last known
/// coordinate in the next window.
#[derive(Debug, Clone, Default)]
pub struct ActivityCounters {
    key_presses: u64,
    mouse_clicks: u64,
    mouse_distance: f64,
    last_position: (f64, f64),
}

impl ActivityCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one input event.
    pub fn record(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPress => self.key_presses += 1,
            InputEvent::MouseClick => self.mouse_clicks += 1,
            InputEvent::MouseMove { x, y } => {
                let (prev_x, prev_y) = self.last_position;
                self.mouse_distance += (x - prev_x).hypot(y - prev_y);
                self.last_position = (x, y);
            }
        }
    }

    pub fn key_presses(&self) -> u64 {
        self.key_presses
    }

    pub fn mouse_clicks(&self) -> u64 {
        self.mouse_clicks
    }

    pub fn mouse_distance(&self) -> f64 {
        self.mouse_distance
    }

    /// Score the current window and reset the counters to zero.
    pub fn flush(&mut self) -> ActivitySample {
        let sample = ActivitySample {
            key_presses: self.key_presses,
            mouse_clicks: self.mouse_clicks,
            mouse_distance: self.mouse_distance,
            focus_score: focus_score(self.key_presses, self.mouse_clicks, self.mouse_distance),
            computed_at: Utc::now(),
        };

        self.key_presses = 0;
        self.mouse_clicks = 0;
        self.mouse_distance = 0.0;

        sample
    }
}
