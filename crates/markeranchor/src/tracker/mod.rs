//! Per-marker pose stabilization.
//!
//! [`MarkerTracker`] turns a noisy stream of `(pose, quality)` samples into a
//! smooth stabilized pose. It owns two leaky timers (limited-quality time and
//! no-pose time) whose thresholds the registry uses to decide when a marker
//! should be hidden, plus the reacquisition guard that keeps a far-away
//! detection right after a dropout from snapping content across the scene.
//!
//! Per frame the caller first feeds the sample (`add_error` / `add_kill_strike`
//! / `update_transform`) and then calls [`MarkerTracker::tick`] once.

mod config;

pub use config::{
    StabilizerConfig, BLEND_MIN_LERP_RATE, FALSE_POSITIVE_STEP, FALSE_POSITIVE_WINDOW_S,
    TIMER_RECOVERY_RATE,
};

use crate::pose::{Pose, TrackingQuality};

/// How a reacquisition (tracking regained after loss) was handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reacquisition {
    /// Large jump shortly after loss. The target was pulled back to a small
    /// step away from the last good pose.
    Suspect { jump: f64 },
    /// Jump outside the dead zone. The lerp rate ramps up from
    /// [`BLEND_MIN_LERP_RATE`].
    Blended { jump: f64 },
    /// Reacquired inside the dead zone.
    InPlace { jump: f64 },
}

/// Result of one [`MarkerTracker::update_transform`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformUpdate {
    /// Whether the stabilized pose was overwritten.
    pub moved: bool,
    /// Set when this sample completed a reacquisition.
    pub reacquisition: Option<Reacquisition>,
}

/// Stabilized pose and tracking-quality state machine for one marker.
#[derive(Debug, Clone)]
pub struct MarkerTracker {
    config: StabilizerConfig,
    pose: Pose,
    last_good: Pose,
    error_timer: f64,
    non_track_timer: f64,
    // Set by add_error / add_kill_strike, consumed by tick.
    error_accumulating: bool,
    non_track_accumulating: bool,
    previous_quality: TrackingQuality,
    was_tracking_lost: bool,
    time_since_lost: f64,
    is_blending: bool,
    blend_factor: f64,
}

impl MarkerTracker {
    /// Create a tracker resting at the identity pose.
    pub fn new(config: StabilizerConfig) -> Self {
        Self::with_pose(config, Pose::default())
    }

    /// Create a tracker resting at `pose`.
    pub fn with_pose(config: StabilizerConfig, pose: Pose) -> Self {
        Self {
            config,
            pose,
            last_good: pose,
            error_timer: 0.0,
            non_track_timer: 0.0,
            error_accumulating: false,
            non_track_accumulating: false,
            previous_quality: TrackingQuality::None,
            was_tracking_lost: false,
            time_since_lost: 0.0,
            is_blending: false,
            blend_factor: 0.0,
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Authoritative stabilized pose.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Snapshot taken after the most recent accepted full-quality update.
    pub fn last_good_pose(&self) -> &Pose {
        &self.last_good
    }

    pub fn error_timer(&self) -> f64 {
        self.error_timer
    }

    pub fn non_track_timer(&self) -> f64 {
        self.non_track_timer
    }

    pub fn previous_quality(&self) -> TrackingQuality {
        self.previous_quality
    }

    pub fn was_tracking_lost(&self) -> bool {
        self.was_tracking_lost
    }

    pub fn time_since_lost(&self) -> f64 {
        self.time_since_lost
    }

    pub fn is_blending(&self) -> bool {
        self.is_blending
    }

    /// Progress through the current reacquisition blend, in `[0, 1]`.
    pub fn blend_factor(&self) -> f64 {
        self.blend_factor
    }

    /// Return every timer and flag to its initial value.
    ///
    /// The stabilized pose and the last good snapshot are kept.
    pub fn reset(&mut self) {
        self.clear_errors();
        self.error_accumulating = false;
        self.non_track_accumulating = false;
        self.previous_quality = TrackingQuality::None;
        self.was_tracking_lost = false;
        self.time_since_lost = 0.0;
        self.is_blending = false;
        self.blend_factor = 0.0;
    }

    /// Advance timers by one frame.
    ///
    /// Timers that did not accumulate since the previous tick recover at
    /// [`TIMER_RECOVERY_RATE`] of real time, clamped at zero.
    pub fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        let recovery = TIMER_RECOVERY_RATE * dt;
        if !self.error_accumulating {
            self.error_timer = (self.error_timer - recovery).max(0.0);
        }
        if !self.non_track_accumulating {
            self.non_track_timer = (self.non_track_timer - recovery).max(0.0);
        }
        self.error_accumulating = false;
        self.non_track_accumulating = false;

        if self.was_tracking_lost {
            self.time_since_lost += dt;
        }

        if self.is_blending {
            // A non-positive blend time means no ramp at all.
            if self.config.reappearance_blend_time > 0.0 {
                self.blend_factor += dt / self.config.reappearance_blend_time;
            } else {
                self.blend_factor = 1.0;
            }
            if self.blend_factor >= 1.0 {
                self.blend_factor = 1.0;
                self.is_blending = false;
            }
        }
    }

    /// Accumulate limited-quality time.
    ///
    /// Returns `true` once the accumulated time exceeds `error_threshold`.
    pub fn add_error(&mut self, dt: f64) -> bool {
        self.error_timer += dt.max(0.0);
        self.error_accumulating = true;
        self.error_timer > self.config.error_threshold
    }

    /// Accumulate no-pose time.
    ///
    /// Returns `true` once the accumulated time exceeds `non_track_threshold`.
    pub fn add_kill_strike(&mut self, dt: f64) -> bool {
        self.non_track_timer += dt.max(0.0);
        self.non_track_accumulating = true;
        self.non_track_timer > self.config.non_track_threshold
    }

    pub fn clear_errors(&mut self) {
        self.error_timer = 0.0;
        self.non_track_timer = 0.0;
    }

    /// Force the stabilized pose back to the last good snapshot.
    pub fn restore_last_good_transform(&mut self) {
        self.pose = self.last_good;
    }

    /// Feed one raw sample. Evaluated once per frame.
    ///
    /// The stabilized pose is never written when `quality` is
    /// [`TrackingQuality::None`].
    pub fn update_transform(
        &mut self,
        target: &Pose,
        quality: TrackingQuality,
        dt: f64,
    ) -> TransformUpdate {
        let reacquiring = quality == TrackingQuality::Tracking
            && self.was_tracking_lost
            && matches!(
                self.previous_quality,
                TrackingQuality::None | TrackingQuality::Limited
            );

        let mut target = *target;
        let mut reacquisition = None;
        if reacquiring {
            let jump = self.pose.distance_to(&target);
            if jump > self.config.max_reacquire_jump
                && self.time_since_lost < FALSE_POSITIVE_WINDOW_S
            {
                target = self.last_good.interpolate(&target, FALSE_POSITIVE_STEP);
                self.start_blend(FALSE_POSITIVE_STEP);
                reacquisition = Some(Reacquisition::Suspect { jump });
            } else if jump > self.config.dead_zone_threshold {
                self.start_blend(0.0);
                reacquisition = Some(Reacquisition::Blended { jump });
            } else {
                reacquisition = Some(Reacquisition::InPlace { jump });
            }
            self.was_tracking_lost = false;
            self.time_since_lost = 0.0;
        }

        let moved = match quality {
            TrackingQuality::Tracking => {
                let outside_dead_zone =
                    self.pose.distance_to(&target) > self.config.dead_zone_threshold;
                let moved = outside_dead_zone || reacquiring;
                if moved {
                    let rate = self.tracking_lerp_rate();
                    self.step_toward(&target, rate, dt);
                    self.last_good = self.pose;
                }
                self.clear_errors();
                moved
            }
            TrackingQuality::Limited => {
                let moved = self.pose.distance_to(&target) > self.config.dead_zone_threshold;
                if moved {
                    self.step_toward(&target, self.config.limited_tracking_lerp_speed, dt);
                }
                if self.previous_quality == TrackingQuality::Tracking {
                    self.flag_lost();
                }
                moved
            }
            TrackingQuality::None => {
                if self.previous_quality.has_pose() {
                    self.flag_lost();
                }
                false
            }
        };

        self.previous_quality = quality;
        TransformUpdate {
            moved,
            reacquisition,
        }
    }

    fn tracking_lerp_rate(&self) -> f64 {
        if self.is_blending {
            BLEND_MIN_LERP_RATE
                + (self.config.tracking_lerp_speed - BLEND_MIN_LERP_RATE) * self.blend_factor
        } else {
            self.config.tracking_lerp_speed
        }
    }

    fn step_toward(&mut self, target: &Pose, rate: f64, dt: f64) {
        let alpha = 1.0 - (-rate * dt.max(0.0)).exp();
        self.pose = self.pose.interpolate(target, alpha);
    }

    fn start_blend(&mut self, from: f64) {
        self.is_blending = true;
        self.blend_factor = from.clamp(0.0, 1.0);
    }

    fn flag_lost(&mut self) {
        if !self.was_tracking_lost {
            self.was_tracking_lost = true;
            self.time_since_lost = 0.0;
        }
    }
}
