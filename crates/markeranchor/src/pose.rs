//! Rigid pose and tracking-quality primitives shared by tracker and registry.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Confidence tier of a marker pose reported for one frame.
///
/// Ordered by goodness: `None < Limited < Tracking`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TrackingQuality {
    /// No pose this frame.
    None,
    /// Degraded-confidence pose.
    Limited,
    /// High-confidence pose.
    Tracking,
}

impl TrackingQuality {
    /// Returns `true` when the subsystem produced any pose this frame.
    pub fn has_pose(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for TrackingQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::None => "none",
            Self::Limited => "limited",
            Self::Tracking => "tracking",
        })
    }
}

/// World-space position + orientation of an anchored entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    /// Construct from components.
    pub fn new(position: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with identity rotation.
    pub fn from_position(position: Vector3<f64>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }

    /// Euclidean distance between the two positions (rotation ignored).
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm()
    }

    /// Linear position / spherical rotation interpolation toward `target`.
    ///
    /// `t` is clamped to `[0, 1]`.
    pub fn interpolate(&self, target: &Pose, t: f64) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(&target.position, t),
            rotation: slerp_or_target(&self.rotation, &target.rotation, t),
        }
    }

    /// Returns `true` when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }
}

fn slerp_or_target(
    from: &UnitQuaternion<f64>,
    to: &UnitQuaternion<f64>,
    t: f64,
) -> UnitQuaternion<f64> {
    // try_slerp gives up on (numerically) opposite quaternions.
    from.try_slerp(to, t, 1.0e-9).unwrap_or(if t < 0.5 { *from } else { *to })
}

/// Pose in plain-array form for serialization.
///
/// Rotation is a quaternion stored as `[i, j, k, w]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PoseParams {
    pub position: [f64; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f64; 4],
}

fn identity_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl From<Pose> for PoseParams {
    fn from(p: Pose) -> Self {
        Self::from(&p)
    }
}

impl From<&Pose> for PoseParams {
    fn from(p: &Pose) -> Self {
        let q = p.rotation.quaternion();
        Self {
            position: [p.position.x, p.position.y, p.position.z],
            rotation: [q.i, q.j, q.k, q.w],
        }
    }
}

impl From<PoseParams> for Pose {
    fn from(p: PoseParams) -> Self {
        Self::from(&p)
    }
}

impl From<&PoseParams> for Pose {
    fn from(p: &PoseParams) -> Self {
        let [i, j, k, w] = p.rotation;
        let q = Quaternion::new(w, i, j, k);
        // Zero or non-finite quaternions fall back to identity.
        let rotation = if q.norm() > 1e-12 && q.coords.iter().all(|v| v.is_finite()) {
            UnitQuaternion::from_quaternion(q)
        } else {
            UnitQuaternion::identity()
        };
        Self {
            position: Vector3::from(p.position),
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quality_goodness_order() {
        assert!(TrackingQuality::Tracking > TrackingQuality::Limited);
        assert!(TrackingQuality::Limited > TrackingQuality::None);
        assert!(!TrackingQuality::None.has_pose());
        assert!(TrackingQuality::Limited.has_pose());
    }

    #[test]
    fn quality_serializes_snake_case() {
        let s = serde_json::to_string(&TrackingQuality::Limited).unwrap();
        assert_eq!(s, "\"limited\"");
        let q: TrackingQuality = serde_json::from_str("\"tracking\"").unwrap();
        assert_eq!(q, TrackingQuality::Tracking);
    }

    #[test]
    fn interpolate_halfway() {
        let a = Pose::default();
        let b = Pose::new(
            Vector3::new(2.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let mid = a.interpolate(&b, 0.5);
        assert_abs_diff_eq!(mid.position.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            mid.rotation.angle(),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-9
        );
    }

    #[test]
    fn interpolate_clamps_t() {
        let a = Pose::default();
        let b = Pose::from_position(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(a.interpolate(&b, 3.0).position, b.position);
        assert_eq!(a.interpolate(&b, -1.0).position, a.position);
    }

    #[test]
    fn params_conversion_keeps_rotation() {
        let pose = Pose::new(
            Vector3::new(0.1, -0.2, 0.3),
            UnitQuaternion::from_euler_angles(0.2, 0.4, -0.3),
        );
        let params = PoseParams::from(&pose);
        let back = Pose::from(params);
        assert_abs_diff_eq!(back.position, pose.position, epsilon = 1e-12);
        assert_abs_diff_eq!(back.rotation.angle_to(&pose.rotation), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_quaternion_falls_back_to_identity() {
        let params = PoseParams {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0, 0.0],
        };
        let pose = Pose::from(params);
        assert_eq!(pose.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn rotation_defaults_to_identity_when_missing() {
        let params: PoseParams = serde_json::from_str(r#"{"position":[0,0,1]}"#).unwrap();
        assert_eq!(params.rotation, [0.0, 0.0, 0.0, 1.0]);
    }
}
