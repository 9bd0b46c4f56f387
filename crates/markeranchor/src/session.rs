//! Frame driver enforcing the per-frame call order.
//!
//! Each [`TrackingSession::frame`] runs, in order: event routing, tracker
//! timer advance, deactivation sweep. Samples reported in a frame are
//! therefore always stamped before the sweep looks at them.

use crate::event::TrackingEvent;
use crate::registry::{EventSummary, MarkerDescriptor, MarkerRegistry, RegistryConfig};
use crate::scene::SceneEntity;

/// Outcome of one [`TrackingSession::frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub events: EventSummary,
    /// Markers hidden by the deactivation sweep this frame.
    pub timed_out: usize,
}

/// Registry plus frame clock.
///
/// A session built from an invalid configuration is *disabled*: it logs the
/// problem once and every later call is a no-op.
#[derive(Debug)]
pub struct TrackingSession<E> {
    registry: Option<MarkerRegistry<E>>,
    now: f64,
    frames: u64,
}

impl<E: SceneEntity> TrackingSession<E> {
    /// Validate `config` and register one entity per descriptor.
    pub fn start<F>(config: RegistryConfig, descriptors: &[MarkerDescriptor], spawn: F) -> Self
    where
        F: FnMut(&MarkerDescriptor) -> E,
    {
        let registry = match config.validate() {
            Ok(()) => {
                let registry = MarkerRegistry::from_descriptors(config, descriptors, spawn);
                tracing::info!(markers = registry.len(), "tracking session started");
                Some(registry)
            }
            Err(err) => {
                tracing::error!("tracking session disabled: {}", err);
                None
            }
        };
        Self {
            registry,
            now: 0.0,
            frames: 0,
        }
    }

    /// Wrap an existing registry.
    pub fn from_registry(registry: MarkerRegistry<E>) -> Self {
        Self {
            registry: Some(registry),
            now: 0.0,
            frames: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Option<&MarkerRegistry<E>> {
        self.registry.as_ref()
    }

    pub fn registry_mut(&mut self) -> Option<&mut MarkerRegistry<E>> {
        self.registry.as_mut()
    }

    /// Session clock in seconds (sum of all frame `dt`s).
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Advance one frame of `dt` seconds with the subsystem's batched delta.
    pub fn frame(&mut self, event: &TrackingEvent, dt: f64) -> FrameReport {
        let Some(registry) = self.registry.as_mut() else {
            return FrameReport::default();
        };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.now += dt;
        self.frames += 1;

        let events = registry.on_tracking_event(event, self.now, dt);
        registry.tick_trackers(dt);
        let timed_out = registry.tick(self.now);

        if events.unknown > 0 || timed_out > 0 {
            tracing::debug!(
                frame = self.frames,
                unknown = events.unknown,
                timed_out,
                "frame processed with lifecycle changes"
            );
        }

        FrameReport { events, timed_out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TrackedSample;
    use crate::pose::{Pose, TrackingQuality};
    use crate::scene::AnchoredContent;

    fn spawn(d: &MarkerDescriptor) -> AnchoredContent {
        AnchoredContent::new(d.name.clone())
    }

    #[test]
    fn invalid_config_disables_session() {
        let mut config = RegistryConfig::default();
        config.stabilizer.error_threshold = -1.0;
        let mut session = TrackingSession::start(config, &[MarkerDescriptor::new("Poster")], spawn);
        assert!(!session.is_enabled());
        let ev = TrackingEvent::added(TrackedSample::new(
            "Poster",
            Pose::default(),
            TrackingQuality::Tracking,
        ));
        assert_eq!(session.frame(&ev, 0.1), FrameReport::default());
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn frame_routes_then_sweeps() {
        let mut session = TrackingSession::start(
            RegistryConfig::default(),
            &[MarkerDescriptor::new("Poster"), MarkerDescriptor::new("Mural")],
            spawn,
        );
        let seen = TrackingEvent {
            added: vec![
                TrackedSample::new("Poster", Pose::default(), TrackingQuality::Tracking),
                TrackedSample::new("Mural", Pose::default(), TrackingQuality::Tracking),
            ],
            ..Default::default()
        };
        let report = session.frame(&seen, 0.25);
        assert_eq!(report.events.activated, 2);

        let only_poster = TrackingEvent::updated(TrackedSample::new(
            "Poster",
            Pose::default(),
            TrackingQuality::Tracking,
        ));
        assert_eq!(session.frame(&only_poster, 0.25).timed_out, 0);
        // Unseen for exactly the delay: kept.
        assert_eq!(session.frame(&only_poster, 0.25).timed_out, 0);
        let report = session.frame(&only_poster, 0.25);
        assert_eq!(report.timed_out, 1);
        let reg = session.registry().unwrap();
        assert_eq!(reg.is_active("Poster"), Some(true));
        assert_eq!(reg.is_active("Mural"), Some(false));
        assert_eq!(session.now(), 1.0);
    }

    #[test]
    fn non_finite_dt_is_treated_as_zero() {
        let markers = [MarkerDescriptor::new("Poster")];
        let mut session = TrackingSession::start(RegistryConfig::default(), &markers, spawn);
        session.frame(&TrackingEvent::default(), f64::NAN);
        assert_eq!(session.now(), 0.0);
        assert_eq!(session.frame_count(), 1);
    }
}
