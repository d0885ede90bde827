//! Session control
//!
//! Starts and stops the sampler pair per user id. A session owns one
//! activity loop and one face loop, wired to a shared shutdown channel; stop
//! signals that channel and gives both threads a grace period to acknowledge
//! before detaching them (best-effort, matching the original terminate then
//! force-kill contract).

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::FocusError;
use crate::provider::FaceDetector;
use crate::sampler::{ActivitySampler, FaceSampler, FrameSource};
use crate::sink::TelemetrySink;
use crate::types::InputEvent;

/// Grace period for sampler threads to acknowledge a stop signal.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Opens a camera for a starting session.
pub trait FrameSourceOpener: Send + Sync {
    /// Open failure is fatal for the start: no session is created.
    fn open(&self) -> Result<Box<dyn FrameSource>, FocusError>;
}

struct SessionHandle {
    instance_id: Uuid,
    shutdown: Sender<()>,
    events: Sender<InputEvent>,
    /// One message per sampler thread on exit.
    done: Receiver<()>,
}

/// Registry of running sampling sessions, keyed by user id.
pub struct SessionManager {
    config: Config,
    detector: Arc<dyn FaceDetector>,
    sink: Arc<dyn TelemetrySink>,
    opener: Arc<dyn FrameSourceOpener>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        config: Config,
        detector: Arc<dyn FaceDetector>,
        sink: Arc<dyn TelemetrySink>,
        opener: Arc<dyn FrameSourceOpener>,
    ) -> Self {
        Self {
            config,
            detector,
            sink,
            opener,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start the sampler pair for a user.
    ///
    /// Rejects an empty user id and a user that is already running; no
    /// partial start. Returns the session instance id.
    pub fn start(&self, user_id: &str) -> Result<Uuid, FocusError> {
        if user_id.trim().is_empty() {
            return Err(FocusError::MissingParameter("userId".to_string()));
        }

        let mut sessions = self.sessions.lock();
        if sessions.contains_key(user_id) {
            return Err(FocusError::SessionAlreadyRunning(user_id.to_string()));
        }

        // Open the camera before spawning anything: a sensor that cannot
        // open rejects the whole start.
        let frames = self.opener.open()?;

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let (events_tx, events_rx) = unbounded::<InputEvent>();
        let (done_tx, done_rx) = bounded::<()>(2);

        let activity = ActivitySampler::new(user_id, self.config.sampling.activity_window());
        let sink = Arc::clone(&self.sink);
        let activity_shutdown = shutdown_rx.clone();
        let activity_done = done_tx.clone();
        thread::Builder::new()
            .name(format!("activity-{user_id}"))
            .spawn(move || {
                activity.run(events_rx, activity_shutdown, sink.as_ref());
                let _ = activity_done.send(());
            })?;

        let face = FaceSampler::new(user_id, self.config.sampling.face_interval());
        let sink = Arc::clone(&self.sink);
        let detector = Arc::clone(&self.detector);
        thread::Builder::new()
            .name(format!("face-{user_id}"))
            .spawn(move || {
                if let Err(e) = face.run(frames, detector.as_ref(), sink.as_ref(), shutdown_rx) {
                    warn!(error = %e, "face sampler exited with error");
                }
                let _ = done_tx.send(());
            })?;

        let instance_id = Uuid::new_v4();
        info!(user_id, %instance_id, "session started");
        sessions.insert(
            user_id.to_string(),
            SessionHandle {
                instance_id,
                shutdown: shutdown_tx,
                events: events_tx,
                done: done_rx,
            },
        );
        Ok(instance_id)
    }

    /// Stop a running session.
    ///
    /// Drops the shutdown channel, which halts both loops within one polling
    /// interval, then waits up to the grace period for each thread to
    /// acknowledge. Threads that do not make it are detached.
    pub fn stop(&self, user_id: &str) -> Result<(), FocusError> {
        let handle = self
            .sessions
            .lock()
            .remove(user_id)
            .ok_or_else(|| FocusError::SessionNotFound(user_id.to_string()))?;

        drop(handle.shutdown);
        drop(handle.events);

        for _ in 0..2 {
            if handle.done.recv_timeout(STOP_GRACE).is_err() {
                warn!(user_id, "sampler did not stop within grace period, detaching");
                break;
            }
        }

        info!(user_id, instance_id = %handle.instance_id, "session stopped");
        Ok(())
    }

    /// Sender for delivering input events into a user's activity loop.
    pub fn event_sender(&self, user_id: &str) -> Result<Sender<InputEvent>, FocusError> {
        self.sessions
            .lock()
            .get(user_id)
            .map(|handle| handle.events.clone())
            .ok_or_else(|| FocusError::SessionNotFound(user_id.to_string()))
    }

    pub fn is_running(&self, user_id: &str) -> bool {
        self.sessions.lock().contains_key(user_id)
    }

    pub fn active_users(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }
}
