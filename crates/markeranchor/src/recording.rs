//! Recorded tracking streams and offline replay.
//!
//! A recording is a JSON document listing the markers to register, an
//! optional registry configuration and the per-frame event deltas. Replaying
//! it drives a [`TrackingSession`] over [`AnchoredContent`] entities and
//! snapshots every marker after each frame.

use std::path::Path;

use crate::event::{SampleParams, TrackedSample, TrackingEvent};
use crate::pose::PoseParams;
use crate::registry::{MarkerDescriptor, RegistryConfig};
use crate::scene::AnchoredContent;
use crate::session::TrackingSession;
use crate::MarkerId;

/// One recorded frame.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FrameRecord {
    /// Frame duration in seconds.
    pub dt: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<SampleParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<SampleParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<MarkerId>,
}

impl FrameRecord {
    pub fn to_event(&self) -> TrackingEvent {
        TrackingEvent {
            added: self.added.iter().map(TrackedSample::from).collect(),
            updated: self.updated.iter().map(TrackedSample::from).collect(),
            removed: self.removed.clone(),
        }
    }
}

/// A full recorded tracking stream.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Recording {
    pub markers: Vec<MarkerDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RegistryConfig>,
    pub frames: Vec<FrameRecord>,
}

impl Recording {
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Total recorded duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames.iter().map(|f| f.dt.max(0.0)).sum()
    }
}

/// State of one marker after a replayed frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerSnapshot {
    pub name: MarkerId,
    pub active: bool,
    #[serde(flatten)]
    pub pose: PoseParams,
}

/// All marker states after one replayed frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReplayFrame {
    pub index: usize,
    pub time: f64,
    pub markers: Vec<MarkerSnapshot>,
}

/// Replay `recording`, using `config` when given, else the recording's own
/// configuration, else defaults.
///
/// Snapshots list markers sorted by name. An invalid configuration yields a
/// disabled session and therefore an empty result.
pub fn replay(recording: &Recording, config: Option<RegistryConfig>) -> Vec<ReplayFrame> {
    let config = config
        .or_else(|| recording.config.clone())
        .unwrap_or_default();
    let mut session = TrackingSession::start(config, &recording.markers, |d| {
        AnchoredContent::new(d.name.clone()).with_info_panels(d.info_panels.iter().cloned())
    });
    if !session.is_enabled() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(recording.frames.len());
    for (index, record) in recording.frames.iter().enumerate() {
        session.frame(&record.to_event(), record.dt);
        let Some(registry) = session.registry() else {
            break;
        };
        let mut ids: Vec<&MarkerId> = registry.identities().collect();
        ids.sort();
        let markers = ids
            .into_iter()
            .filter_map(|id| {
                let entity = registry.entity(id.as_str())?;
                Some(MarkerSnapshot {
                    name: id.clone(),
                    active: entity.is_active(),
                    pose: PoseParams::from(entity.pose()),
                })
            })
            .collect();
        out.push(ReplayFrame {
            index,
            time: session.now(),
            markers,
        });
    }
    out
}
