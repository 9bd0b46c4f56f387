use std::path::Path;

use crate::tracker::StabilizerConfig;
use crate::{AnchorError, MarkerId};

/// One marker the registry should manage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerDescriptor {
    /// Identity reported by the tracking subsystem.
    pub name: MarkerId,
    /// Labels of auxiliary info panels attached to the content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info_panels: Vec<String>,
}

impl MarkerDescriptor {
    pub fn new(name: impl Into<MarkerId>) -> Self {
        Self {
            name: name.into(),
            info_panels: Vec::new(),
        }
    }
}

/// Registry-level lifecycle configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Per-marker stabilizer tuning, shared by every tracker.
    pub stabilizer: StabilizerConfig,
    /// Seconds without any event after which an active marker is hidden.
    pub deactivation_delay: f64,
    /// Whether a hidden marker may come back on a full-quality update.
    pub allow_reactivation: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            stabilizer: StabilizerConfig::default(),
            deactivation_delay: 0.5,
            allow_reactivation: true,
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), AnchorError> {
        self.stabilizer.validate()?;
        if !self.deactivation_delay.is_finite() || self.deactivation_delay < 0.0 {
            return Err(AnchorError::InvalidConfig(format!(
                "deactivation_delay must be finite and >= 0 (got {})",
                self.deactivation_delay
            )));
        }
        Ok(())
    }

    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_config_is_valid() {
        assert!(RegistryConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let cfg = RegistryConfig {
            deactivation_delay: -0.1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AnchorError::InvalidConfig(_))));
    }

    #[test]
    fn nested_stabilizer_errors_surface() {
        let mut cfg = RegistryConfig::default();
        cfg.stabilizer.tracking_lerp_speed = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_round_trip_and_partial_override() {
        let json = serde_json::to_string(&RegistryConfig::default()).unwrap();
        let back: RegistryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RegistryConfig::default());

        let partial: RegistryConfig = serde_json::from_str(
            r#"{"allow_reactivation": false, "stabilizer": {"error_threshold": 3.0}}"#,
        )
        .unwrap();
        assert!(!partial.allow_reactivation);
        assert_eq!(partial.stabilizer.error_threshold, 3.0);
        assert_eq!(partial.deactivation_delay, 0.5);
    }

    #[test]
    fn descriptor_panels_are_optional() {
        let d: MarkerDescriptor = serde_json::from_str(r#"{"name":"Poster"}"#).unwrap();
        assert_eq!(d, MarkerDescriptor::new("Poster"));
    }
}
