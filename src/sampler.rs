//! Sampling loops driving the two focus estimators
//!
//! Both estimators run as long-lived sequential loops. The activity loop
//! accumulates input events over a fixed wall-clock window, then flushes:
//! score, emit to the sink, reset, accumulate again. The face loop samples a
//! frame on a fixed interval, runs it through detection and the head-pose
//! scorer, and forwards the result. Blocking on I/O inside either loop is
//! acceptable; the sampling cadence is coarse.
//!
//! Cancellation is cooperative: both loops observe a dropped or signalled
//! shutdown channel within one polling interval.

use std::time::Duration;

use crossbeam_channel::{never, select, tick, Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::activity::ActivityCounters;
use crate::error::FocusError;
use crate::head_pose::HeadPoseScorer;
use crate::provider::{first_observation, FaceDetector};
use crate::sink::TelemetrySink;
use crate::types::{ActivityFocusEvent, FaceFocusEvent, InputEvent};

/// Boundary trait for the camera.
///
/// Opening the source is the caller's job and happens before a session
/// starts; an open failure rejects the whole start. A capture failure
/// mid-loop is unrecoverable and ends the face loop.
pub trait FrameSource: Send {
    /// Capture one encoded frame.
    fn capture(&mut self) -> Result<Vec<u8>, FocusError>;
}

/// Windowed sampling loop for the input-activity estimator.
///
/// Owns its counters; input hooks deliver [`InputEvent`]s over a channel
/// rather than mutating shared state.
pub struct ActivitySampler {
    user_id: String,
    window: Duration,
    counters: ActivityCounters,
}

impl ActivitySampler {
    pub fn new(user_id: impl Into<String>, window: Duration) -> Self {
        Self {
            user_id: user_id.into(),
            window,
            counters: ActivityCounters::new(),
        }
    }

    /// Run until the shutdown channel is signalled or dropped.
    ///
    /// Events are applied to the counters as they arrive. Every elapsed
    /// window the counters are scored, emitted, and reset. A partial window
    /// at shutdown is discarded.
    pub fn run(mut self, events: Receiver<InputEvent>, shutdown: Receiver<()>, sink: &dyn TelemetrySink) {
        info!(
            user_id = %self.user_id,
            window_secs = self.window.as_secs_f64(),
            "activity sampler started"
        );

        let ticker = tick(self.window);
        let mut events = events;

        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => self.counters.record(event),
                    Err(_) => {
                        // Listeners are gone; keep flushing windows until the
                        // session is stopped.
                        debug!(user_id = %self.user_id, "input event channel closed");
                        events = never();
                    }
                },
                recv(ticker) -> _ => self.flush(sink),
                recv(shutdown) -> _ => {
                    info!(user_id = %self.user_id, "activity sampler stopping");
                    return;
                }
            }
        }
    }

    fn flush(&mut self, sink: &dyn TelemetrySink) {
        let sample = self.counters.flush();
        info!(
            user_id = %self.user_id,
            score = sample.focus_score,
            keys = sample.key_presses,
            clicks = sample.mouse_clicks,
            distance_px = sample.mouse_distance,
            "activity window flushed"
        );

        let event = ActivityFocusEvent {
            user_id: self.user_id.clone(),
            keyboard: sample.key_presses,
            mouse_clicks: sample.mouse_clicks,
            mouse_distance: sample.mouse_distance.round() as u64,
            focus_score: sample.focus_score,
        };

        if let Err(e) = sink.post_activity(&event) {
            warn!(user_id = %self.user_id, error = %e, "failed to forward activity event");
        }
    }
}

/// Fixed-interval sampling loop for the head-pose estimator.
pub struct FaceSampler {
    user_id: String,
    interval: Duration,
    scorer: HeadPoseScorer,
}

impl FaceSampler {
    pub fn new(user_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            user_id: user_id.into(),
            interval,
            scorer: HeadPoseScorer::new(),
        }
    }

    /// Run until shutdown, a capture failure, or the camera going away.
    ///
    /// Provider failures and frames without a face skip the cycle; only the
    /// frame source failing is unrecoverable.
    pub fn run(
        mut self,
        mut frames: Box<dyn FrameSource>,
        detector: &dyn FaceDetector,
        sink: &dyn TelemetrySink,
        shutdown: Receiver<()>,
    ) -> Result<(), FocusError> {
        info!(
            user_id = %self.user_id,
            interval_secs = self.interval.as_secs_f64(),
            "face sampler started"
        );

        loop {
            match shutdown.recv_timeout(self.interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!(user_id = %self.user_id, "face sampler stopping");
                    return Ok(());
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let frame = frames.capture()?;
            self.sample(&frame, detector, sink);
        }
    }

    fn sample(&mut self, frame: &[u8], detector: &dyn FaceDetector, sink: &dyn TelemetrySink) {
        let faces = match detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "face detection call failed");
                return;
            }
        };

        let Some(sample) = self.scorer.score(first_observation(&faces)) else {
            debug!(user_id = %self.user_id, "no face detected, skipping cycle");
            return;
        };

        if sample.eye_occluded {
            info!(user_id = %self.user_id, "eyes occluded, possible fatigue");
        }
        info!(
            user_id = %self.user_id,
            score = sample.focus_score,
            yaw = sample.yaw,
            pitch = sample.pitch,
            "face focus scored"
        );

        let event = FaceFocusEvent {
            user_id: self.user_id.clone(),
            focus_score: sample.focus_score,
            yaw: sample.yaw,
            pitch: sample.pitch,
        };

        if let Err(e) = sink.post_face(&event) {
            warn!(user_id = %self.user_id, error = %e, "failed to forward face event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DetectedFace;
    use crossbeam_channel::{bounded, unbounded};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    /// Sink fake recording every event it receives.
    #[derive(Default)]
    struct MemorySink {
        face: Mutex<Vec<FaceFocusEvent>>,
        activity: Mutex<Vec<ActivityFocusEvent>>,
        fail: bool,
    }

    impl TelemetrySink for MemorySink {
        fn post_face(&self, event: &FaceFocusEvent) -> Result<(), FocusError> {
            if self.fail {
                return Err(FocusError::SinkError("unreachable".into()));
            }
            self.face.lock().push(event.clone());
            Ok(())
        }

        fn post_activity(&self, event: &ActivityFocusEvent) -> Result<(), FocusError> {
            if self.fail {
                return Err(FocusError::SinkError("unreachable".into()));
            }
            self.activity.lock().push(event.clone());
            Ok(())
        }
    }

    /// Detector fake replaying canned responses, repeating the last one.
    struct ScriptedDetector {
        responses: Mutex<Vec<Result<Vec<DetectedFace>, String>>>,
    }

    impl ScriptedDetector {
        fn faces(yaw: f64, pitch: f64) -> Vec<DetectedFace> {
            serde_json::from_str(&format!(
                r#"[{{"faceAttributes": {{"headPose": {{"yaw": {yaw}, "pitch": {pitch}}}}}}}]"#
            ))
            .unwrap()
        }

        fn new(responses: Vec<Result<Vec<DetectedFace>, String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedFace>, FocusError> {
            let mut responses = self.responses.lock();
            let next = if responses.len() > 1 {
                responses.pop().unwrap()
            } else {
                responses.last().cloned().unwrap_or(Ok(Vec::new()))
            };
            next.map_err(FocusError::ProviderError)
        }
    }

    struct StaticFrames {
        failures_after: Option<usize>,
        captured: usize,
    }

    impl StaticFrames {
        fn endless() -> Box<dyn FrameSource> {
            Box::new(Self {
                failures_after: None,
                captured: 0,
            })
        }

        fn failing_after(n: usize) -> Box<dyn FrameSource> {
            Box::new(Self {
                failures_after: Some(n),
                captured: 0,
            })
        }
    }

    impl FrameSource for StaticFrames {
        fn capture(&mut self) -> Result<Vec<u8>, FocusError> {
            if let Some(limit) = self.failures_after {
                if self.captured >= limit {
                    return Err(FocusError::FrameSourceError("camera disconnected".into()));
                }
            }
            self.captured += 1;
            Ok(vec![0xff, 0xd8, 0xff])
        }
    }

    #[test]
    fn test_activity_loop_flushes_and_resets_each_window() {
        let sink = Arc::new(MemorySink::default());
        let (events_tx, events_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        for _ in 0..3 {
            events_tx.send(InputEvent::KeyPress).unwrap();
        }
        events_tx.send(InputEvent::MouseClick).unwrap();
        events_tx.send(InputEvent::MouseMove { x: 30.0, y: 40.0 }).unwrap();

        let sampler = ActivitySampler::new("user-1", Duration::from_millis(40));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || sampler.run(events_rx, shutdown_rx, thread_sink.as_ref()));

        // Let at least two windows elapse, then stop.
        thread::sleep(Duration::from_millis(140));
        drop(shutdown_tx);
        handle.join().unwrap();

        let flushed = sink.activity.lock();
        assert!(flushed.len() >= 2, "expected at least two windows, got {}", flushed.len());

        let first = &flushed[0];
        assert_eq!(first.user_id, "user-1");
        assert_eq!(first.keyboard, 3);
        assert_eq!(first.mouse_clicks, 1);
        assert_eq!(first.mouse_distance, 50);
        assert_eq!(first.focus_score, focus_score_for(3, 1, 50.0));

        // The second window starts from zero.
        let second = &flushed[1];
        assert_eq!(second.keyboard, 0);
        assert_eq!(second.mouse_clicks, 0);
        assert_eq!(second.focus_score, 0.0);
    }

    fn focus_score_for(keys: u64, clicks: u64, distance: f64) -> f64 {
        crate::activity::focus_score(keys, clicks, distance)
    }

    #[test]
    fn test_activity_loop_survives_closed_event_channel() {
        let sink = Arc::new(MemorySink::default());
        let (events_tx, events_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        events_tx.send(InputEvent::KeyPress).unwrap();
        drop(events_tx);

        let sampler = ActivitySampler::new("user-1", Duration::from_millis(30));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || sampler.run(events_rx, shutdown_rx, thread_sink.as_ref()));

        thread::sleep(Duration::from_millis(100));
        drop(shutdown_tx);
        handle.join().unwrap();

        let flushed = sink.activity.lock();
        assert!(!flushed.is_empty());
        assert_eq!(flushed[0].keyboard, 1);
    }

    #[test]
    fn test_activity_loop_stops_within_one_window_of_shutdown() {
        let sink = Arc::new(MemorySink::default());
        let (_events_tx, events_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        // A long window must not delay shutdown.
        let sampler = ActivitySampler::new("user-1", Duration::from_secs(300));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || sampler.run(events_rx, shutdown_rx, thread_sink.as_ref()));

        let started = Instant::now();
        drop(shutdown_tx);
        handle.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        // The partial window was discarded, nothing reached the sink.
        assert!(sink.activity.lock().is_empty());
    }

    #[test]
    fn test_face_loop_scores_and_forwards() {
        let sink = Arc::new(MemorySink::default());
        let detector = ScriptedDetector::new(vec![Ok(ScriptedDetector::faces(0.0, 0.0))]);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let sampler = FaceSampler::new("user-1", Duration::from_millis(20));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || {
            sampler.run(StaticFrames::endless(), &detector, thread_sink.as_ref(), shutdown_rx)
        });

        thread::sleep(Duration::from_millis(90));
        drop(shutdown_tx);
        handle.join().unwrap().unwrap();

        let scored = sink.face.lock();
        assert!(!scored.is_empty());
        assert_eq!(scored[0].user_id, "user-1");
        assert_eq!(scored[0].focus_score, 100.0);
        assert_eq!(scored[0].yaw, 0.0);
    }

    #[test]
    fn test_face_loop_skips_no_face_and_provider_failures() {
        let sink = Arc::new(MemorySink::default());
        let detector = ScriptedDetector::new(vec![
            Ok(Vec::new()),
            Err("429 too many requests".to_string()),
            Ok(ScriptedDetector::faces(10.0, 0.0)),
        ]);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let sampler = FaceSampler::new("user-1", Duration::from_millis(15));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || {
            sampler.run(StaticFrames::endless(), &detector, thread_sink.as_ref(), shutdown_rx)
        });

        thread::sleep(Duration::from_millis(120));
        drop(shutdown_tx);
        handle.join().unwrap().unwrap();

        let scored = sink.face.lock();
        // The two skipped cycles produced nothing; the first real score has
        // no movement penalty.
        assert!(!scored.is_empty());
        assert_eq!(scored[0].focus_score, 90.0);
    }

    #[test]
    fn test_face_loop_ends_on_capture_failure() {
        let sink = Arc::new(MemorySink::default());
        let detector = ScriptedDetector::new(vec![Ok(ScriptedDetector::faces(0.0, 0.0))]);
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let sampler = FaceSampler::new("user-1", Duration::from_millis(10));
        let result = sampler.run(
            StaticFrames::failing_after(2),
            &detector,
            sink.as_ref(),
            shutdown_rx,
        );

        assert!(matches!(result, Err(FocusError::FrameSourceError(_))));
        assert_eq!(sink.face.lock().len(), 2);
    }

    #[test]
    fn test_face_loop_absorbs_sink_failures() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..MemorySink::default()
        });
        let detector = ScriptedDetector::new(vec![Ok(ScriptedDetector::faces(0.0, 0.0))]);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let sampler = FaceSampler::new("user-1", Duration::from_millis(15));
        let thread_sink = Arc::clone(&sink);
        let handle = thread::spawn(move || {
            sampler.run(StaticFrames::endless(), &detector, thread_sink.as_ref(), shutdown_rx)
        });

        // Sink failures are logged, the loop keeps running until shutdown.
        thread::sleep(Duration::from_millis(60));
        drop(shutdown_tx);
        assert!(handle.join().unwrap().is_ok());
    }
}
