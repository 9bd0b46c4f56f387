//! markeranchor — keep virtual content steady on top of tracked image markers.
//!
//! A camera-based tracking subsystem reports, once per frame, which markers
//! were added, updated or removed, each with a raw pose and a quality tier
//! (tracking / limited / none). That signal is noisy and intermittent; this
//! crate turns it into stable, flicker-free content.
//!
//! 1. **Tracker** – per-marker stabilizer: dead zone, two-tier exponential
//!    lerp, leaky error/no-pose timers, and a reacquisition guard that damps
//!    suspicious far jumps right after a dropout.
//! 2. **Registry** – identity → (tracker, entity, last-seen) map that decides
//!    when content is shown, hidden or shown again, decoupled from the raw
//!    added/removed stream.
//! 3. **Session** – per-frame driver: route events, advance timers, sweep.
//!
//! # Public API
//! - [`TrackingSession`] and [`MarkerRegistry`] as entry points
//! - [`MarkerTracker`] for direct use of the stabilizer
//! - [`SceneEntity`] as the rendering-side boundary
//! - [`Recording`] / [`replay`] for offline analysis

mod error;
mod event;
mod marker_id;
mod pose;
mod recording;
mod registry;
mod scene;
mod session;
mod tracker;

pub use error::AnchorError;
pub use event::{SampleParams, TrackedSample, TrackingEvent};
pub use marker_id::MarkerId;
pub use pose::{Pose, PoseParams, TrackingQuality};
pub use recording::{replay, FrameRecord, MarkerSnapshot, Recording, ReplayFrame};
pub use registry::{
    EventSummary, MarkerDescriptor, MarkerRegistry, RegistryConfig, RouteOutcome,
};
pub use scene::{billboard_rotation, AnchoredContent, InfoPanel, SceneEntity};
pub use session::{FrameReport, TrackingSession};
pub use tracker::{
    MarkerTracker, Reacquisition, StabilizerConfig, TransformUpdate, BLEND_MIN_LERP_RATE,
    FALSE_POSITIVE_STEP, FALSE_POSITIVE_WINDOW_S, TIMER_RECOVERY_RATE,
};

pub use nalgebra::{UnitQuaternion, Vector3};
