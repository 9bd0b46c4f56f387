use crate::AnchorError;

/// Lower bound of the tracking lerp rate while a reacquisition blend is running.
pub const BLEND_MIN_LERP_RATE: f64 = 2.0;

/// Fraction of the accumulation rate at which error/kill timers recover.
pub const TIMER_RECOVERY_RATE: f64 = 0.5;

/// Loss duration (seconds) below which a large reacquisition jump is suspect.
pub const FALSE_POSITIVE_WINDOW_S: f64 = 1.0;

/// Step taken from the last good pose toward a suspect reacquisition target.
pub const FALSE_POSITIVE_STEP: f64 = 0.1;

/// Tuning for a single marker's pose stabilizer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Accumulated limited-quality time (s) after which the marker is dropped.
    pub error_threshold: f64,
    /// Accumulated no-pose time (s) after which the marker is dropped.
    pub non_track_threshold: f64,
    /// Duration (s) of the lerp-rate ramp after a large reacquisition jump.
    pub reappearance_blend_time: f64,
    /// Exponential lerp rate (1/s) under full-quality tracking.
    pub tracking_lerp_speed: f64,
    /// Exponential lerp rate (1/s) under limited-quality tracking.
    pub limited_tracking_lerp_speed: f64,
    /// Minimum position change (m) that moves the stabilized pose.
    pub dead_zone_threshold: f64,
    /// Reacquisition jump (m) above which a fresh detection is treated as suspect.
    pub max_reacquire_jump: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            error_threshold: 1.5,
            non_track_threshold: 1.0,
            reappearance_blend_time: 0.5,
            tracking_lerp_speed: 15.0,
            limited_tracking_lerp_speed: 5.0,
            dead_zone_threshold: 0.005,
            max_reacquire_jump: 0.2,
        }
    }
}

impl StabilizerConfig {
    /// Check that every field is finite and in range.
    pub fn validate(&self) -> Result<(), AnchorError> {
        let positive = [
            ("error_threshold", self.error_threshold),
            ("non_track_threshold", self.non_track_threshold),
            ("reappearance_blend_time", self.reappearance_blend_time),
            ("tracking_lerp_speed", self.tracking_lerp_speed),
            ("limited_tracking_lerp_speed", self.limited_tracking_lerp_speed),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(AnchorError::InvalidConfig(format!(
                    "{name} must be finite and > 0 (got {v})"
                )));
            }
        }

        let non_negative = [
            ("dead_zone_threshold", self.dead_zone_threshold),
            ("max_reacquire_jump", self.max_reacquire_jump),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(AnchorError::InvalidConfig(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StabilizerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_blend_time() {
        let cfg = StabilizerConfig {
            reappearance_blend_time: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(
            err,
            AnchorError::InvalidConfig(ref m) if m.contains("reappearance_blend_time")
        ));
    }

    #[test]
    fn rejects_nan_dead_zone() {
        let cfg = StabilizerConfig {
            dead_zone_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: StabilizerConfig = serde_json::from_str(r#"{"max_reacquire_jump": 0.5}"#).unwrap();
        assert_eq!(cfg.max_reacquire_jump, 0.5);
        assert_eq!(cfg.error_threshold, StabilizerConfig::default().error_threshold);
    }
}
