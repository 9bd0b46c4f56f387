//! Marker identity → (tracker, entity, last-seen time) registry.
//!
//! [`MarkerRegistry`] owns one [`MarkerTracker`] and one scene entity per
//! registered marker and layers its own activation lifecycle on top of the
//! tracking subsystem's added/updated/removed stream:
//!
//! - *added* always activates,
//! - *updated* may reactivate a hidden marker, but only on full quality,
//! - *removed* is ignored; hiding is left to the quality timers and to the
//!   time-based sweep in [`MarkerRegistry::tick`].

mod config;

pub use config::{MarkerDescriptor, RegistryConfig};

use std::collections::HashMap;

use crate::event::{TrackedSample, TrackingEvent};
use crate::pose::TrackingQuality;
use crate::scene::SceneEntity;
use crate::tracker::{MarkerTracker, Reacquisition, TransformUpdate};
use crate::{AnchorError, MarkerId};

/// What [`MarkerRegistry::route_sample`] did with a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteOutcome {
    /// The sample went through the tracker's state machine.
    Updated(TransformUpdate),
    /// An error/kill timer crossed its threshold and the marker was hidden.
    Deactivated,
}

/// Counters for one [`MarkerRegistry::on_tracking_event`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub routed: usize,
    pub activated: usize,
    pub deactivated: usize,
    pub unknown: usize,
}

#[derive(Debug)]
struct MarkerEntry<E> {
    tracker: MarkerTracker,
    entity: E,
    active: bool,
    last_seen: Option<f64>,
}

impl<E: SceneEntity> MarkerEntry<E> {
    /// Returns `true` on an inactive → active transition.
    ///
    /// The transition is a reset: the marker counts as unseen until the
    /// caller stamps it again.
    fn show(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.tracker.reset();
        self.last_seen = None;
        self.active = true;
        self.entity.set_active(true);
        self.entity.apply_pose(self.tracker.pose());
        true
    }

    /// Returns `true` on an active → inactive transition.
    fn hide(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.tracker.clear_errors();
        self.active = false;
        self.entity.set_active(false);
        true
    }
}

/// Owns every registered marker's tracker and entity.
#[derive(Debug)]
pub struct MarkerRegistry<E> {
    config: RegistryConfig,
    entries: HashMap<MarkerId, MarkerEntry<E>>,
}

impl<E: SceneEntity> MarkerRegistry<E> {
    /// Empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Registry with one entity per descriptor, created by `spawn`.
    pub fn from_descriptors<F>(
        config: RegistryConfig,
        descriptors: &[MarkerDescriptor],
        mut spawn: F,
    ) -> Self
    where
        F: FnMut(&MarkerDescriptor) -> E,
    {
        let mut registry = Self::new(config);
        for desc in descriptors {
            let entity = spawn(desc);
            registry.register(desc.name.clone(), entity);
        }
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register `entity` under `id`, hidden, with a fresh tracker.
    ///
    /// A duplicate identity replaces the previous entry (last registration
    /// wins) and the replaced entity is returned.
    pub fn register(&mut self, id: impl Into<MarkerId>, mut entity: E) -> Option<E> {
        let id = id.into();
        entity.set_active(false);
        let entry = MarkerEntry {
            tracker: MarkerTracker::new(self.config.stabilizer.clone()),
            entity,
            active: false,
            last_seen: None,
        };
        let replaced = self.entries.insert(id.clone(), entry);
        if replaced.is_some() {
            tracing::warn!(marker = %id, "duplicate marker registration; keeping the latest");
        } else {
            tracing::debug!(marker = %id, "registered marker");
        }
        replaced.map(|e| e.entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered identities, in arbitrary order.
    pub fn identities(&self) -> impl Iterator<Item = &MarkerId> + '_ {
        self.entries.keys()
    }

    pub fn is_active(&self, id: &str) -> Option<bool> {
        self.entries.get(id).map(|e| e.active)
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.active).count()
    }

    pub fn tracker(&self, id: &str) -> Option<&MarkerTracker> {
        self.entries.get(id).map(|e| &e.tracker)
    }

    pub fn entity(&self, id: &str) -> Option<&E> {
        self.entries.get(id).map(|e| &e.entity)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut E> {
        self.entries.get_mut(id).map(|e| &mut e.entity)
    }

    /// Time of the most recent added/updated event, `None` if never seen.
    pub fn last_seen(&self, id: &str) -> Option<f64> {
        self.entries.get(id).and_then(|e| e.last_seen)
    }

    /// Apply one frame's batched delta.
    ///
    /// Unknown identities are logged and skipped; they never affect other
    /// markers.
    pub fn on_tracking_event(
        &mut self,
        event: &TrackingEvent,
        now: f64,
        dt: f64,
    ) -> EventSummary {
        let mut summary = EventSummary::default();

        for sample in &event.added {
            let Some(entry) = self.entries.get_mut(sample.id.as_str()) else {
                tracing::warn!(marker = %sample.id, "added event for unregistered marker");
                summary.unknown += 1;
                continue;
            };
            if entry.show() {
                tracing::info!(marker = %sample.id, quality = %sample.quality, "marker activated");
                summary.activated += 1;
            }
            entry.last_seen = Some(now);
            self.route_counted(sample, dt, &mut summary);
        }

        for sample in &event.updated {
            let allow_reactivation = self.config.allow_reactivation;
            let Some(entry) = self.entries.get_mut(sample.id.as_str()) else {
                tracing::warn!(marker = %sample.id, "updated event for unregistered marker");
                summary.unknown += 1;
                continue;
            };
            if !entry.active
                && allow_reactivation
                && sample.quality == TrackingQuality::Tracking
                && entry.show()
            {
                tracing::info!(marker = %sample.id, "marker reactivated");
                summary.activated += 1;
            }
            entry.last_seen = Some(now);
            self.route_counted(sample, dt, &mut summary);
        }

        for id in &event.removed {
            tracing::trace!(marker = %id, "removed event left to the deactivation sweep");
        }

        summary
    }

    fn route_counted(&mut self, sample: &TrackedSample, dt: f64, summary: &mut EventSummary) {
        match self.route_sample(sample, dt) {
            Ok(RouteOutcome::Deactivated) => {
                summary.routed += 1;
                summary.deactivated += 1;
            }
            Ok(RouteOutcome::Updated(_)) => summary.routed += 1,
            Err(err) => {
                tracing::warn!("{}", err);
                summary.unknown += 1;
            }
        }
    }

    /// Dispatch one sample to its tracker by quality.
    ///
    /// Limited and no-pose samples feed the tracker's error/kill timers first;
    /// crossing a threshold hides the marker immediately.
    pub fn route_sample(
        &mut self,
        sample: &TrackedSample,
        dt: f64,
    ) -> Result<RouteOutcome, AnchorError> {
        let entry = self
            .entries
            .get_mut(sample.id.as_str())
            .ok_or_else(|| AnchorError::NotFound(sample.id.clone()))?;

        let over_threshold = match sample.quality {
            TrackingQuality::Tracking => false,
            TrackingQuality::Limited => entry.tracker.add_error(dt),
            TrackingQuality::None => entry.tracker.add_kill_strike(dt),
        };
        if over_threshold {
            if entry.hide() {
                tracing::info!(
                    marker = %sample.id,
                    quality = %sample.quality,
                    "marker deactivated after sustained degraded tracking"
                );
            }
            return Ok(RouteOutcome::Deactivated);
        }

        let update = entry
            .tracker
            .update_transform(&sample.pose, sample.quality, dt);
        match update.reacquisition {
            Some(Reacquisition::Suspect { jump }) => {
                tracing::debug!(marker = %sample.id, jump, "suspect reacquisition jump damped");
            }
            Some(Reacquisition::Blended { jump }) => {
                tracing::debug!(marker = %sample.id, jump, "reacquired; blending to new pose");
            }
            Some(Reacquisition::InPlace { .. }) | None => {}
        }
        if entry.active && update.moved {
            entry.entity.apply_pose(entry.tracker.pose());
        }
        Ok(RouteOutcome::Updated(update))
    }

    /// Advance every tracker's timers by `dt`.
    pub fn tick_trackers(&mut self, dt: f64) {
        for entry in self.entries.values_mut() {
            entry.tracker.tick(dt);
        }
    }

    /// Deactivation sweep: hide active markers not seen for longer than
    /// `deactivation_delay`. Returns how many were hidden.
    pub fn tick(&mut self, now: f64) -> usize {
        let delay = self.config.deactivation_delay;
        let mut hidden = 0;
        for (id, entry) in self.entries.iter_mut() {
            let Some(seen) = entry.last_seen else {
                continue;
            };
            if entry.active && now - seen > delay && entry.hide() {
                tracing::info!(marker = %id, unseen_s = now - seen, "marker timed out");
                hidden += 1;
            }
        }
        hidden
    }

    /// Hide a marker and clear its error timers.
    ///
    /// Returns `Ok(false)` when it was already hidden.
    pub fn deactivate(&mut self, id: &str) -> Result<bool, AnchorError> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| AnchorError::NotFound(MarkerId::from(id)))?;
        Ok(entry.hide())
    }

    /// Show a hidden marker again, keeping its last stabilized pose.
    ///
    /// Returns `Ok(false)` if reactivation is disabled by configuration and
    /// the marker is hidden.
    pub fn reactivate(&mut self, id: &str) -> Result<bool, AnchorError> {
        let allow = self.config.allow_reactivation;
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| AnchorError::NotFound(MarkerId::from(id)))?;
        if entry.active {
            entry.tracker.clear_errors();
            return Ok(true);
        }
        if !allow {
            tracing::debug!(marker = %id, "reactivation disabled; marker stays hidden");
            return Ok(false);
        }
        entry.show();
        Ok(true)
    }

    /// Snap a marker back to its last good pose and push it to the entity.
    pub fn restore_last_good(&mut self, id: &str) -> Result<(), AnchorError> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| AnchorError::NotFound(MarkerId::from(id)))?;
        entry.tracker.restore_last_good_transform();
        if entry.active {
            entry.entity.apply_pose(entry.tracker.pose());
        }
        Ok(())
    }
}
