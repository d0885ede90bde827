//! Aura Focus - focus telemetry engine
//!
//! Two independent estimators approximate attentiveness as a 0-100 focus
//! score: head-pose stability sampled through periodic face detection, and
//! keyboard/mouse activity accumulated over fixed wall-clock windows. Each
//! estimator is driven by its own sampling loop and forwards scores as flat
//! JSON events to an HTTP telemetry sink.
//!
//! ## Modules
//!
//! - **head_pose**: stateful head-pose focus scorer (centrality + movement penalties)
//! - **activity**: windowed input-activity counters and the pure activity scorer
//! - **sampler**: the sampling loops driving both estimators
//! - **session**: per-user start/stop of the sampler pair with cooperative shutdown
//! - **provider** / **sink**: the HTTP boundaries (face detection, telemetry backend)

pub mod activity;
pub mod config;
pub mod error;
pub mod head_pose;
pub mod provider;
pub mod sampler;
pub mod session;
pub mod sink;
pub mod types;

pub use config::Config;
pub use error::FocusError;
pub use head_pose::HeadPoseScorer;
pub use provider::{FaceDetector, HttpFaceDetector};
pub use sampler::{ActivitySampler, FaceSampler, FrameSource};
pub use session::{FrameSourceOpener, SessionManager};
pub use sink::{HttpTelemetrySink, TelemetrySink};
pub use types::{ActivitySample, FaceFocusSample, FaceObservation, InputEvent};

/// Crate version embedded in diagnostics output
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for telemetry provenance
pub const PRODUCER_NAME: &str = "aura-focus";
