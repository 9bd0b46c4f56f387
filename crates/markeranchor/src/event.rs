//! Batched per-frame delta delivered by the tracking subsystem.

use crate::pose::{Pose, PoseParams, TrackingQuality};
use crate::MarkerId;

/// One marker observation: identity, raw pose and its quality tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSample {
    pub id: MarkerId,
    pub pose: Pose,
    pub quality: TrackingQuality,
}

impl TrackedSample {
    pub fn new(id: impl Into<MarkerId>, pose: Pose, quality: TrackingQuality) -> Self {
        Self {
            id: id.into(),
            pose,
            quality,
        }
    }
}

/// Added / updated / removed markers reported for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingEvent {
    pub added: Vec<TrackedSample>,
    pub updated: Vec<TrackedSample>,
    pub removed: Vec<MarkerId>,
}

impl TrackingEvent {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Event carrying a single newly detected marker.
    pub fn added(sample: TrackedSample) -> Self {
        Self {
            added: vec![sample],
            ..Default::default()
        }
    }

    /// Event carrying a single update for an already known marker.
    pub fn updated(sample: TrackedSample) -> Self {
        Self {
            updated: vec![sample],
            ..Default::default()
        }
    }
}

/// Serialized form of [`TrackedSample`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SampleParams {
    pub name: MarkerId,
    #[serde(flatten)]
    pub pose: PoseParams,
    pub quality: TrackingQuality,
}

impl From<&SampleParams> for TrackedSample {
    fn from(p: &SampleParams) -> Self {
        Self {
            id: p.name.clone(),
            pose: Pose::from(&p.pose),
            quality: p.quality,
        }
    }
}

impl From<&TrackedSample> for SampleParams {
    fn from(s: &TrackedSample) -> Self {
        Self {
            name: s.id.clone(),
            pose: PoseParams::from(&s.pose),
            quality: s.quality,
        }
    }
}
